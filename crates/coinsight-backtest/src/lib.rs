pub mod alerts;
pub mod daemon;
pub mod error;
pub mod report;
pub mod runner;

pub use alerts::evaluate_alerts;
pub use daemon::{DailySchedule, Daemon};
pub use error::BacktestError;
pub use report::backtest_summary;
pub use runner::BacktestRunner;
