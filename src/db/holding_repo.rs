use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Holding;

/// Get all holdings for a user, alphabetical by symbol.
pub async fn get_all(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Holding>> {
    let holdings = sqlx::query_as::<_, Holding>(
        "SELECT * FROM holdings WHERE user_id = $1 ORDER BY symbol",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(holdings)
}

/// Lock the (user, symbol) holding row, if any, for the surrounding
/// transaction.
pub async fn lock(
    conn: &mut PgConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT * FROM holdings WHERE user_id = $1 AND symbol = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(conn)
    .await
}

/// Create a position or replace the quantity/cost of an existing one.
/// Used for BUY, where the caller has already recomputed the weighted
/// average cost over the combined position.
pub async fn upsert(
    conn: &mut PgConnection,
    user_id: Uuid,
    symbol: &str,
    company_name: &str,
    quantity: i64,
    average_cost: Decimal,
    last_price: Decimal,
) -> Result<Holding, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        r#"
        INSERT INTO holdings (user_id, symbol, company_name, quantity, average_cost, last_price)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id, symbol) DO UPDATE
            SET quantity = $4, average_cost = $5, last_price = $6,
                company_name = $3, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(symbol)
    .bind(company_name)
    .bind(quantity)
    .bind(average_cost)
    .bind(last_price)
    .fetch_one(conn)
    .await
}

/// Set the remaining quantity after a partial SELL. Average cost is
/// untouched by sells.
pub async fn update_quantity(
    conn: &mut PgConnection,
    id: Uuid,
    quantity: i64,
    last_price: Decimal,
) -> Result<Holding, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        r#"
        UPDATE holdings
        SET quantity = $2, last_price = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(quantity)
    .bind(last_price)
    .fetch_one(conn)
    .await
}

/// Remove a holding whose quantity has reached zero.
pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM holdings WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Refresh the cached display price after a valuation. Best-effort: the
/// valuation response is computed from live quotes regardless.
pub async fn update_last_price(
    pool: &PgPool,
    id: Uuid,
    price: Decimal,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE holdings SET last_price = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(price)
        .execute(pool)
        .await?;

    Ok(())
}
