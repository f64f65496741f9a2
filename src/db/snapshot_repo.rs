use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{PortfolioSnapshot, SnapshotHolding};

/// Write the day's snapshot unless one already exists. The unique
/// (user_id, snapshot_date) index makes concurrent callers race safely:
/// exactly one row lands, the rest insert nothing and return None.
pub async fn insert_if_absent(
    pool: &PgPool,
    user_id: Uuid,
    snapshot_date: NaiveDate,
    holdings_value: Decimal,
    cash_balance: Decimal,
    total_value: Decimal,
    holdings: Vec<SnapshotHolding>,
) -> anyhow::Result<Option<PortfolioSnapshot>> {
    let snapshot = sqlx::query_as::<_, PortfolioSnapshot>(
        r#"
        INSERT INTO portfolio_snapshots
            (user_id, snapshot_date, holdings_value, cash_balance, total_value, holdings)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, snapshot_date) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(snapshot_date)
    .bind(holdings_value)
    .bind(cash_balance)
    .bind(total_value)
    .bind(Json(holdings))
    .fetch_optional(pool)
    .await?;

    Ok(snapshot)
}

/// Snapshot series for charting, oldest first. `since = None` returns the
/// full history.
pub async fn list_since(
    pool: &PgPool,
    user_id: Uuid,
    since: Option<NaiveDate>,
) -> anyhow::Result<Vec<PortfolioSnapshot>> {
    let snapshots = match since {
        Some(date) => {
            sqlx::query_as::<_, PortfolioSnapshot>(
                r#"
                SELECT * FROM portfolio_snapshots
                WHERE user_id = $1 AND snapshot_date >= $2
                ORDER BY snapshot_date ASC
                "#,
            )
            .bind(user_id)
            .bind(date)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, PortfolioSnapshot>(
                "SELECT * FROM portfolio_snapshots WHERE user_id = $1 ORDER BY snapshot_date ASC",
            )
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(snapshots)
}

/// Whether a snapshot already exists for the given day.
pub async fn exists_for_day(
    pool: &PgPool,
    user_id: Uuid,
    snapshot_date: NaiveDate,
) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM portfolio_snapshots WHERE user_id = $1 AND snapshot_date = $2)",
    )
    .bind(user_id)
    .bind(snapshot_date)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}
