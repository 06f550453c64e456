use crate::analysis::indicators::IndicatorSet;
use crate::domain::{AssetClass, Timeframe};
use crate::time::expiry;
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 4 => Self::High,
            s if s >= 2 => Self::Medium,
            _ => Self::Low,
        }
    }

    /// Sort key: lower ranks first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

/// Provider-declared short-term outlook direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlook {
    Up,
    Down,
    Other,
}

impl Outlook {
    /// Only the exact lowercase `up` / `down` directions count.
    pub fn from_provider(direction: &str) -> Self {
        match direction {
            "up" => Self::Up,
            "down" => Self::Down,
            _ => Self::Other,
        }
    }

    pub fn agrees_with(&self, trend: Trend) -> bool {
        matches!(
            (self, trend),
            (Self::Up, Trend::Bullish) | (Self::Down, Trend::Bearish)
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub asset_class: AssetClass,
    #[serde(rename = "price")]
    pub current_price: f64,
    pub currency: String,
    pub trend: Trend,
    #[serde(rename = "recommendation")]
    pub action: Action,
    pub confidence: Confidence,
    #[serde(rename = "entry")]
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    #[serde(rename = "potential")]
    pub potential_percent: f64,
    pub support: f64,
    pub resistance: f64,
    #[serde(serialize_with = "expiry::serialize_display")]
    pub expiration: DateTime<Local>,
    pub timeframe: Timeframe,
    pub indicators: IndicatorSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationSet {
    #[serde(rename = "timestamp", serialize_with = "expiry::serialize_display")]
    pub generated_at: DateTime<Local>,
    pub timeframe: Timeframe,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn new(
        generated_at: DateTime<Local>,
        timeframe: Timeframe,
        recommendations: Vec<Recommendation>,
    ) -> Self {
        Self {
            generated_at,
            timeframe,
            count: recommendations.len(),
            recommendations,
        }
    }
}
