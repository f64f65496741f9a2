use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::Mutex;

use super::types::Quote;
use super::{QuoteError, QuoteProvider};

/// Short-TTL read-through cache in front of a live quote provider.
///
/// Keeps repeated portfolio reads from hammering the upstream API.
/// Correctness never depends on it: a fetch failure is propagated whenever
/// any requested symbol is missing from the fresh set.
pub struct QuoteCache {
    inner: Arc<dyn QuoteProvider>,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedQuote>>,
}

struct CachedQuote {
    quote: Quote,
    fetched_at: Instant,
}

impl QuoteCache {
    pub fn new(inner: Arc<dyn QuoteProvider>, ttl_secs: u64) -> Self {
        Self {
            inner,
            ttl: Duration::from_secs(ttl_secs),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl QuoteProvider for QuoteCache {
    async fn get_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, QuoteError> {
        let mut fresh: HashMap<String, Quote> = HashMap::new();
        let mut misses: Vec<String> = Vec::new();

        {
            let entries = self.entries.lock().await;
            for symbol in symbols {
                match entries.get(symbol) {
                    Some(cached) if cached.fetched_at.elapsed() < self.ttl => {
                        fresh.insert(symbol.clone(), cached.quote.clone());
                    }
                    _ => misses.push(symbol.clone()),
                }
            }
        }

        counter!("quote_cache_hits").increment(fresh.len() as u64);
        counter!("quote_cache_misses").increment(misses.len() as u64);

        if misses.is_empty() {
            return Ok(fresh);
        }

        let fetched = self.inner.get_quotes(&misses).await?;

        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        for (symbol, quote) in &fetched {
            entries.insert(
                symbol.clone(),
                CachedQuote {
                    quote: quote.clone(),
                    fetched_at: now,
                },
            );
        }
        drop(entries);

        fresh.extend(fetched);
        Ok(fresh)
    }
}
