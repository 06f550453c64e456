pub mod instrument;
pub mod recommendation;
pub mod timeframe;

pub use instrument::{AssetClass, Instrument, InstrumentRegistry};
pub use recommendation::{Action, Confidence, Outlook, Recommendation, RecommendationSet, Trend};
pub use timeframe::Timeframe;
