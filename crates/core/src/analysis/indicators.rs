//! Simplified technical indicators over a closing-price series.
//!
//! These are deliberately cheap heuristics: the "EMA" legs of MACD are plain
//! averages and RSI is a single backward-window ratio without smoothing.

use crate::domain::Trend;
use serde::Serialize;

/// Below this many valid closes no indicators are produced.
pub const MIN_POINTS: usize = 10;
pub const DEFAULT_VOLATILITY: f64 = 0.02;
pub const DEFAULT_RSI: f64 = 50.0;

const SMA_SHORT_WINDOW: usize = 5;
const SMA_MEDIUM_WINDOW: usize = 10;
const RSI_LOOKBACK: usize = 14;
const MACD_FAST_WINDOW: usize = 12;
const MACD_SLOW_WINDOW: usize = 26;

/// Indicator values for one series. Every field is absent when the series was
/// too short; use the `*_or_default` accessors downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IndicatorSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_short: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma_medium: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<f64>,
}

impl IndicatorSet {
    pub fn is_empty(&self) -> bool {
        self.sma_short.is_none()
            && self.sma_medium.is_none()
            && self.rsi.is_none()
            && self.macd.is_none()
    }

    pub fn sma_short_or_default(&self) -> f64 {
        self.sma_short.unwrap_or(0.0)
    }

    pub fn sma_medium_or_default(&self) -> f64 {
        self.sma_medium.unwrap_or(0.0)
    }

    pub fn rsi_or_default(&self) -> f64 {
        self.rsi.unwrap_or(DEFAULT_RSI)
    }

    pub fn macd_or_default(&self) -> f64 {
        self.macd.unwrap_or(0.0)
    }
}

/// Drops missing and non-finite closes, keeping order.
pub fn valid_closes(raw: &[Option<f64>]) -> Vec<f64> {
    raw.iter()
        .filter_map(|p| *p)
        .filter(|p| p.is_finite())
        .collect()
}

/// Computes the indicator set from already-filtered closes (oldest first).
pub fn compute(closes: &[f64]) -> IndicatorSet {
    if closes.len() < MIN_POINTS {
        return IndicatorSet::default();
    }

    IndicatorSet {
        sma_short: Some(mean_of_last(closes, SMA_SHORT_WINDOW)),
        sma_medium: Some(mean_of_last(closes, SMA_MEDIUM_WINDOW)),
        rsi: Some(rsi(closes)),
        macd: Some(macd(closes)),
    }
}

/// Mean of the last `window` values, or of all of them when fewer exist.
fn mean_of_last(closes: &[f64], window: usize) -> f64 {
    let tail = &closes[closes.len().saturating_sub(window)..];
    if tail.is_empty() {
        return 0.0;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Walks backward from the newest close over at most `RSI_LOOKBACK - 1`
/// deltas, summing gains and losses.
pub fn rsi(closes: &[f64]) -> f64 {
    let n = closes.len();
    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..RSI_LOOKBACK.min(n) {
        let diff = closes[n - i] - closes[n - i - 1];
        if diff > 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }

    if gains + losses <= 0.0 {
        return DEFAULT_RSI;
    }
    let ratio = if losses > 0.0 { gains / losses } else { 100.0 };
    100.0 - (100.0 / (1.0 + ratio))
}

/// Difference of a 12- and 26-close simple average. A leg with too little
/// history collapses to the newest close.
pub fn macd(closes: &[f64]) -> f64 {
    let Some(&last) = closes.last() else {
        return 0.0;
    };
    let leg = |window: usize| {
        if closes.len() >= window {
            mean_of_last(closes, window)
        } else {
            last
        }
    };
    leg(MACD_FAST_WINDOW) - leg(MACD_SLOW_WINDOW)
}

/// Mean absolute relative change between consecutive closes. Pairs whose
/// prior close is not positive are skipped.
pub fn volatility(closes: &[f64]) -> f64 {
    if closes.len() < 2 {
        return DEFAULT_VOLATILITY;
    }

    let changes: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| ((w[1] - w[0]) / w[0]).abs())
        .collect();

    if changes.is_empty() {
        return DEFAULT_VOLATILITY;
    }
    changes.iter().sum::<f64>() / changes.len() as f64
}

/// First vs last close.
pub fn trend(closes: &[f64]) -> Trend {
    match (closes.first(), closes.last()) {
        (Some(first), Some(last)) if closes.len() >= 2 => {
            if last > first {
                Trend::Bullish
            } else if last < first {
                Trend::Bearish
            } else {
                Trend::Neutral
            }
        }
        _ => Trend::Neutral,
    }
}
