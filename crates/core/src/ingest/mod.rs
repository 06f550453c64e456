pub mod provider;
pub mod types;
pub mod yahoo;

pub use provider::{PricePoint, PriceSeries, QuoteBundle, QuoteError, QuoteSource};
pub use yahoo::YahooQuoteSource;
