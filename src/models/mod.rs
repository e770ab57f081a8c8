pub mod candle;
pub mod direction;
pub mod signal;
pub mod timeframe;

pub use candle::{Candle, CandleSeries};
pub use direction::Direction;
pub use signal::Signal;
pub use timeframe::Timeframe;
