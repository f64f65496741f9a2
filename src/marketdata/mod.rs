pub mod cache;
pub mod types;
pub mod yahoo;

pub use cache::QuoteCache;
pub use types::Quote;
pub use yahoo::YahooClient;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Source of current prices for ticker symbols.
///
/// The returned map contains an entry for every symbol the provider
/// recognizes; unknown symbols are simply absent, not an error. An `Err`
/// means the whole batch failed (network, timeout, malformed payload) and
/// callers must not assume any coverage.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn get_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, QuoteError>;
}
