use crate::analysis::indicators;
use crate::domain::{Outlook, Timeframe};
use crate::ingest::types::{ChartResult, InsightsResponse};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("quote request failed for {symbol}: {source}")]
    Network {
        symbol: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("quote provider returned HTTP {status} for {symbol}")]
    Http {
        symbol: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed quote response for {symbol}: {detail}")]
    Malformed { symbol: String, detail: String },
}

impl QuoteError {
    pub fn malformed(symbol: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            symbol: symbol.to_string(),
            detail: detail.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Malformed { .. } => false,
        }
    }
}

/// Source of per-instrument quote data. A failure means "skip this
/// instrument", never "abort the batch".
#[async_trait::async_trait]
pub trait QuoteSource: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<QuoteBundle, QuoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub close: Option<f64>,
}

/// Closing prices for one lookback window, oldest first. Provider gaps are
/// kept as `None` until analysis filters them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn from_closes(closes: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self {
            points: closes
                .into_iter()
                .map(|close| PricePoint {
                    timestamp: None,
                    close,
                })
                .collect(),
        }
    }

    /// Pairs closes with timestamps by position; a missing timestamp does not
    /// drop its close.
    pub fn from_chart(result: &ChartResult) -> Self {
        let timestamps = result.timestamps();
        let points = result
            .closes()
            .iter()
            .enumerate()
            .map(|(i, close)| PricePoint {
                timestamp: timestamps
                    .get(i)
                    .copied()
                    .flatten()
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
                close: *close,
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn raw_closes(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn valid_closes(&self) -> Vec<f64> {
        indicators::valid_closes(&self.raw_closes())
    }
}

/// Everything fetched for one instrument in one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBundle {
    pub symbol: String,
    pub current_price: f64,
    pub currency: String,
    pub series: PriceSeries,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
    pub outlook: Option<Outlook>,
}

impl QuoteBundle {
    /// Builds a bundle from a chart result plus optional insights. The chart
    /// must carry a positive market price.
    pub fn from_provider(
        symbol: &str,
        chart: &ChartResult,
        insights: Option<&InsightsResponse>,
    ) -> Result<Self, QuoteError> {
        let current_price = chart
            .regular_market_price()
            .ok_or_else(|| QuoteError::malformed(symbol, "missing meta.regularMarketPrice"))?;
        if !current_price.is_finite() || current_price <= 0.0 {
            return Err(QuoteError::malformed(
                symbol,
                format!("non-positive market price {current_price}"),
            ));
        }

        Ok(Self {
            symbol: symbol.to_string(),
            current_price,
            currency: chart.currency(),
            series: PriceSeries::from_chart(chart),
            support: insights.and_then(InsightsResponse::support),
            resistance: insights.and_then(InsightsResponse::resistance),
            outlook: insights
                .and_then(InsightsResponse::short_term_direction)
                .map(Outlook::from_provider),
        })
    }
}
