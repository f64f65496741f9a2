pub mod ledger;
pub mod order_executor;
pub mod snapshotter;
pub mod user_locks;
pub mod valuation;

pub use order_executor::{ExecutionOutcome, OrderExecutor, TradeError};
pub use valuation::PortfolioView;
