use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::holding_repo;
use crate::marketdata::QuoteProvider;
use crate::models::HoldingView;

/// A user's holdings valuated against current prices.
#[derive(Debug, Serialize)]
pub struct PortfolioView {
    pub holdings: Vec<HoldingView>,
    pub total_market_value: Decimal,
    pub priced_at: DateTime<Utc>,
}

/// Read all holdings for a user, price them in one batched quote call,
/// and derive market value and unrealized P&L per position.
///
/// Symbols the provider did not price keep their cached `last_price`
/// (falling back to cost basis if no price was ever cached) and are
/// flagged `stale`, so correctness-sensitive consumers can tell a live
/// price from a leftover. A total provider failure degrades to an
/// all-stale view rather than failing the read. Prices that did come
/// back are written to the holding rows best-effort; the response is
/// computed from the live quotes either way.
pub async fn valuate(
    pool: &PgPool,
    quotes: &Arc<dyn QuoteProvider>,
    user_id: Uuid,
) -> anyhow::Result<PortfolioView> {
    let holdings = holding_repo::get_all(pool, user_id).await?;
    let priced_at = Utc::now();

    if holdings.is_empty() {
        return Ok(PortfolioView {
            holdings: Vec::new(),
            total_market_value: Decimal::ZERO,
            priced_at,
        });
    }

    let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
    let price_map = match quotes.get_quotes(&symbols).await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                error = %e,
                "Quote provider unavailable — valuating from cached prices"
            );
            Default::default()
        }
    };

    let mut views = Vec::with_capacity(holdings.len());
    let mut total_market_value = Decimal::ZERO;

    for holding in &holdings {
        let view = match price_map.get(&holding.symbol) {
            Some(quote) => {
                if let Err(e) = holding_repo::update_last_price(pool, holding.id, quote.price).await
                {
                    tracing::warn!(
                        symbol = %holding.symbol,
                        error = %e,
                        "Failed to refresh cached holding price"
                    );
                }
                HoldingView::from_holding(holding, quote.price, false)
            }
            None => {
                let cached = holding.last_price.unwrap_or(holding.average_cost);
                HoldingView::from_holding(holding, cached, true)
            }
        };

        total_market_value += view.market_value;
        views.push(view);
    }

    Ok(PortfolioView {
        holdings: views,
        total_market_value,
        priced_at,
    })
}
