use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::types::{ChartEnvelope, Quote, QuoteEnvelope, SearchEnvelope};
use super::{QuoteError, QuoteProvider};

const QUOTE_API_BASE: &str = "https://query1.finance.yahoo.com";

// Yahoo rejects requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Live market-data client over the Yahoo Finance public endpoints.
#[derive(Debug, Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    /// Build a client with a bounded request timeout so a hung provider
    /// surfaces as an error instead of stalling order execution.
    pub fn new(base_url: Option<String>, timeout_secs: u64) -> Result<Self, QuoteError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.unwrap_or_else(|| QUOTE_API_BASE.into()),
        })
    }

    /// Search for symbols matching a free-text query.
    pub async fn search(&self, query: &str, count: u32) -> Result<SearchEnvelope, QuoteError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let count = count.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("quotesCount", count.as_str()),
                ("newsCount", "0"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let envelope: SearchEnvelope = resp.json().await?;
        Ok(envelope)
    }

    /// Fetch OHLC chart data for one symbol. The payload is forwarded to
    /// the frontend as-is, so only the envelope is typed.
    pub async fn chart(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<serde_json::Value, QuoteError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("interval", interval),
                ("range", range),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let envelope: ChartEnvelope = resp.json().await?;
        envelope
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| QuoteError::Unexpected(format!("no chart data for {symbol}")))
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn get_quotes(&self, symbols: &[String]) -> Result<HashMap<String, Quote>, QuoteError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!("{}/v7/finance/quote", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("symbols", symbols.join(","))])
            .send()
            .await?
            .error_for_status()?;

        let envelope: QuoteEnvelope = resp.json().await?;

        let mut quotes = HashMap::new();
        for api_quote in envelope.quote_response.result {
            // Symbols without a market price (delisted, bad suffix) are
            // treated the same as unknown symbols: absent from the map.
            let Some(price) = api_quote.regular_market_price else {
                continue;
            };
            quotes.insert(
                api_quote.symbol.clone(),
                Quote {
                    symbol: api_quote.symbol.clone(),
                    company_name: api_quote.company_name(),
                    price,
                },
            );
        }

        Ok(quotes)
    }
}
