use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced symbol as surfaced to the rest of the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub company_name: String,
    pub price: Decimal,
}

// ---------------------------------------------------------------------------
// Yahoo quote API wire types (v7/finance/quote)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    pub quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    #[serde(default)]
    pub result: Vec<ApiQuote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiQuote {
    pub symbol: String,
    #[serde(default, rename = "regularMarketPrice")]
    pub regular_market_price: Option<Decimal>,
    #[serde(default, rename = "longName")]
    pub long_name: Option<String>,
    #[serde(default, rename = "shortName")]
    pub short_name: Option<String>,
}

impl ApiQuote {
    /// Display name, preferring the long form. Falls back to the symbol
    /// itself when the provider sends neither.
    pub fn company_name(&self) -> String {
        self.long_name
            .clone()
            .or_else(|| self.short_name.clone())
            .unwrap_or_else(|| self.symbol.clone())
    }
}

// ---------------------------------------------------------------------------
// Yahoo search API wire types (v1/finance/search)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub quotes: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "shortname")]
    pub short_name: Option<String>,
    #[serde(default, rename = "longname")]
    pub long_name: Option<String>,
    #[serde(default, rename = "quoteType")]
    pub quote_type: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
}

// ---------------------------------------------------------------------------
// Yahoo chart API wire types (v8/finance/chart)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartOuter,
}

#[derive(Debug, Deserialize)]
pub struct ChartOuter {
    #[serde(default)]
    pub result: Option<Vec<serde_json::Value>>,
}
