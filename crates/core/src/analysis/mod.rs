pub mod indicators;
pub mod signal;

pub use indicators::IndicatorSet;
pub use signal::{synthesize, Signal, SignalInput};
