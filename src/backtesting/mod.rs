pub mod data_fetcher;
pub mod evaluator;
pub mod report;
pub mod runner;

pub use data_fetcher::{fetch_history, FetchSettings};
pub use evaluator::evaluate;
pub use report::{EvaluationResult, Outcome, PricePoint};
pub use runner::SignalTester;
