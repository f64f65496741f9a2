use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Watchlist, WatchlistEntry};

const DEFAULT_NAME: &str = "Default Watchlist";

/// Fetch the user's default watchlist, creating it on first access.
pub async fn get_or_create_default(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Watchlist> {
    sqlx::query(
        r#"
        INSERT INTO watchlists (user_id, name)
        VALUES ($1, $2)
        ON CONFLICT (user_id, name) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(DEFAULT_NAME)
    .execute(pool)
    .await?;

    let watchlist = sqlx::query_as::<_, Watchlist>(
        "SELECT * FROM watchlists WHERE user_id = $1 AND name = $2",
    )
    .bind(user_id)
    .bind(DEFAULT_NAME)
    .fetch_one(pool)
    .await?;

    Ok(watchlist)
}

/// Entries of a watchlist, oldest first.
pub async fn entries(pool: &PgPool, watchlist_id: Uuid) -> anyhow::Result<Vec<WatchlistEntry>> {
    let entries = sqlx::query_as::<_, WatchlistEntry>(
        "SELECT * FROM watchlist_entries WHERE watchlist_id = $1 ORDER BY added_at",
    )
    .bind(watchlist_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Add a symbol. Returns None when the symbol is already on the list.
pub async fn add_entry(
    pool: &PgPool,
    watchlist_id: Uuid,
    symbol: &str,
    company_name: &str,
) -> anyhow::Result<Option<WatchlistEntry>> {
    let entry = sqlx::query_as::<_, WatchlistEntry>(
        r#"
        INSERT INTO watchlist_entries (watchlist_id, symbol, company_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (watchlist_id, symbol) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(watchlist_id)
    .bind(symbol)
    .bind(company_name)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Remove a symbol. Returns false when it was not on the list.
pub async fn remove_entry(
    pool: &PgPool,
    watchlist_id: Uuid,
    symbol: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        "DELETE FROM watchlist_entries WHERE watchlist_id = $1 AND symbol = $2",
    )
    .bind(watchlist_id)
    .bind(symbol)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
