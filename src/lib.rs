pub mod backtesting;
pub mod config;
pub mod error;
pub mod exchange;
pub mod models;
pub mod parser;
#[cfg(test)]
pub mod test_helpers;
