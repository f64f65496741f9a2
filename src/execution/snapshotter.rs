use metrics::counter;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::snapshot_repo;
use crate::models::{Account, PortfolioSnapshot, SnapshotHolding};

use super::valuation::PortfolioView;

/// Record today's portfolio value for history charting, at most once per
/// UTC calendar day per user.
///
/// Triggered opportunistically from portfolio reads with the valuation
/// that read already produced. Idempotency rests on the unique
/// (user_id, snapshot_date) index, so N calls in one day — even
/// concurrent ones — land exactly one row. Returns the snapshot when this
/// call was the one that wrote it.
pub async fn snapshot_if_needed(
    pool: &PgPool,
    user_id: Uuid,
    account: &Account,
    view: &PortfolioView,
) -> anyhow::Result<Option<PortfolioSnapshot>> {
    let today = view.priced_at.date_naive();

    if snapshot_repo::exists_for_day(pool, user_id, today).await? {
        return Ok(None);
    }

    let holdings: Vec<SnapshotHolding> = view
        .holdings
        .iter()
        .map(|h| SnapshotHolding {
            symbol: h.symbol.clone(),
            company_name: h.company_name.clone(),
            quantity: h.quantity,
            price: h.current_price,
            value: h.market_value,
        })
        .collect();

    let snapshot = snapshot_repo::insert_if_absent(
        pool,
        user_id,
        today,
        view.total_market_value,
        account.cash_balance,
        view.total_market_value + account.cash_balance,
        holdings,
    )
    .await?;

    if let Some(ref snap) = snapshot {
        counter!("snapshots_written_total").increment(1);
        tracing::debug!(
            user_id = %user_id,
            date = %snap.snapshot_date,
            total = %snap.total_value,
            "Portfolio snapshot written"
        );
    }

    Ok(snapshot)
}
