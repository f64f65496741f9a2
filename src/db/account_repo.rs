use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::Account;

/// Fetch a user's account, creating it with the configured starting
/// balance on first touch. Registration is handled by the identity layer,
/// so the ledger is provisioned lazily here.
pub async fn get_or_create(
    pool: &PgPool,
    user_id: Uuid,
    starting_balance: Decimal,
) -> anyhow::Result<Account> {
    sqlx::query(
        r#"
        INSERT INTO accounts (user_id, cash_balance, initial_balance)
        VALUES ($1, $2, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(starting_balance)
    .execute(pool)
    .await?;

    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(account)
}

/// Fetch an account without creating it.
pub async fn get(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Account>> {
    let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(account)
}

/// Provision the account inside an order transaction if it does not
/// exist yet. Idempotent; keeps first-order-ever and every later order on
/// the same code path.
pub async fn ensure(
    conn: &mut PgConnection,
    user_id: Uuid,
    starting_balance: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO accounts (user_id, cash_balance, initial_balance)
        VALUES ($1, $2, $2)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(starting_balance)
    .execute(conn)
    .await?;

    Ok(())
}

/// Lock an account row for the duration of the surrounding transaction.
/// Concurrent orders for the same user queue on this row lock, so balance
/// reads inside the transaction cannot be lost to an interleaved writer.
pub async fn lock(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE user_id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

/// Write the post-trade balance. Must run inside the transaction that
/// holds the row lock.
pub async fn update_balance(
    conn: &mut PgConnection,
    user_id: Uuid,
    new_balance: Decimal,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET cash_balance = $2, updated_at = NOW()
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(new_balance)
    .fetch_one(conn)
    .await
}
