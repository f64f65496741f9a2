use axum::extract::{Query, State};
use axum::{Extension, Json};
use chrono::{Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::auth::UserId;
use crate::db::{account_repo, snapshot_repo};
use crate::errors::AppError;
use crate::execution::{snapshotter, valuation, PortfolioView};
use crate::AppState;

#[derive(Serialize)]
pub struct PortfolioResponse {
    pub portfolio: PortfolioView,
    pub cash_balance: Decimal,
    pub initial_balance: Decimal,
}

/// GET /api/portfolio — valuated holdings plus cash. Also the trigger
/// point for the daily snapshot.
pub async fn get(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let account =
        account_repo::get_or_create(&state.db, user_id, state.config.starting_balance).await?;
    let view = valuation::valuate(&state.db, &state.quotes, user_id).await?;

    // Snapshot failures must not fail the read.
    if let Err(e) = snapshotter::snapshot_if_needed(&state.db, user_id, &account, &view).await {
        tracing::warn!(user_id = %user_id, error = %e, "Snapshot write failed");
    }

    Ok(Json(PortfolioResponse {
        portfolio: view,
        cash_balance: account.cash_balance,
        initial_balance: account.initial_balance,
    }))
}

#[derive(Serialize)]
pub struct AllocationEntry {
    pub symbol: String,
    pub company_name: String,
    pub value: Decimal,
    pub percentage: Decimal,
}

#[derive(Serialize)]
pub struct PerformanceResponse {
    pub portfolio_value: Decimal,
    pub cash_balance: Decimal,
    pub invested_value: Decimal,
    pub initial_balance: Decimal,
    pub total_gain: Decimal,
    pub total_gain_percentage: Decimal,
    pub allocation: Vec<AllocationEntry>,
}

/// GET /api/portfolio/performance — gain vs starting balance and the
/// per-symbol allocation split, cash included as a pseudo-position.
pub async fn performance(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> Result<Json<PerformanceResponse>, AppError> {
    let account =
        account_repo::get_or_create(&state.db, user_id, state.config.starting_balance).await?;
    let view = valuation::valuate(&state.db, &state.quotes, user_id).await?;

    let invested_value = view.total_market_value;
    let portfolio_value = invested_value + account.cash_balance;
    let total_gain = portfolio_value - account.initial_balance;
    let total_gain_percentage = if account.initial_balance.is_zero() {
        Decimal::ZERO
    } else {
        total_gain / account.initial_balance * Decimal::from(100)
    };

    let pct_of_total = |value: Decimal| {
        if portfolio_value.is_zero() {
            Decimal::ZERO
        } else {
            value / portfolio_value * Decimal::from(100)
        }
    };

    let mut allocation: Vec<AllocationEntry> = view
        .holdings
        .iter()
        .map(|h| AllocationEntry {
            symbol: h.symbol.clone(),
            company_name: h.company_name.clone(),
            value: h.market_value,
            percentage: pct_of_total(h.market_value),
        })
        .collect();

    allocation.push(AllocationEntry {
        symbol: "CASH".into(),
        company_name: "Cash Balance".into(),
        value: account.cash_balance,
        percentage: pct_of_total(account.cash_balance),
    });

    Ok(Json(PerformanceResponse {
        portfolio_value,
        cash_balance: account.cash_balance,
        invested_value,
        initial_balance: account.initial_balance,
        total_gain,
        total_gain_percentage,
        allocation,
    }))
}

#[derive(Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_period")]
    pub period: String,
}

fn default_period() -> String {
    "1m".into()
}

#[derive(Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub portfolio_value: Decimal,
    pub cash_balance: Decimal,
}

/// GET /api/portfolio/history?period= — snapshot series for charting.
pub async fn history(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryPoint>>, AppError> {
    let since = period_start(&params.period);
    let snapshots = snapshot_repo::list_since(&state.db, user_id, since).await?;

    let points = snapshots
        .into_iter()
        .map(|s| HistoryPoint {
            date: s.snapshot_date,
            total_value: s.total_value,
            portfolio_value: s.holdings_value,
            cash_balance: s.cash_balance,
        })
        .collect();

    Ok(Json(points))
}

/// Map a chart period to its start date; None means the full history.
/// Unknown values fall back to one month.
fn period_start(period: &str) -> Option<NaiveDate> {
    let today = Utc::now().date_naive();
    match period {
        "1w" => Some(today - Duration::days(7)),
        "3m" => months_back(today, 3),
        "6m" => months_back(today, 6),
        "1y" => today.with_year(today.year() - 1).or(Some(today - Duration::days(365))),
        "all" => None,
        _ => months_back(today, 1),
    }
}

fn months_back(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let zero_based = date.month0() as i32 - months as i32;
    let year = date.year() + zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;

    // Clamp the day for short target months (e.g. Mar 31 → Feb 28).
    (1..=4u32).find_map(|back| {
        date.day()
            .checked_sub(back - 1)
            .and_then(|day| NaiveDate::from_ymd_opt(year, month, day))
    })
}
