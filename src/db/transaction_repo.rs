use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{OrderKind, Side, Transaction};

/// Append a completed transaction. Runs inside the order transaction so
/// the history row commits or rolls back together with the ledgers.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    conn: &mut PgConnection,
    user_id: Uuid,
    side: Side,
    symbol: &str,
    company_name: &str,
    quantity: i64,
    price: Decimal,
    total_amount: Decimal,
    order_kind: OrderKind,
    limit_price: Option<Decimal>,
) -> Result<Transaction, sqlx::Error> {
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions
            (user_id, side, symbol, company_name, quantity, price, total_amount, order_kind, limit_price, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'COMPLETED')
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(side.as_str())
    .bind(symbol)
    .bind(company_name)
    .bind(quantity)
    .bind(price)
    .bind(total_amount)
    .bind(order_kind.as_str())
    .bind(limit_price)
    .fetch_one(conn)
    .await
}

/// Get a user's transaction history, newest first.
pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Transaction>> {
    let transactions = sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE user_id = $1 ORDER BY executed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

/// Fetch a single transaction by id.
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(transaction)
}

/// Count a user's transactions.
pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}
