use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis horizon. Picks the provider sampling resolution, the risk
/// multiplier applied to volatility, and how long a recommendation stays valid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "12h")]
    HalfDay,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    Week,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::HalfDay,
        Timeframe::Day,
        Timeframe::ThreeDays,
        Timeframe::Week,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "12h" => Some(Self::HalfDay),
            "24h" => Some(Self::Day),
            "3d" => Some(Self::ThreeDays),
            "1w" => Some(Self::Week),
            _ => None,
        }
    }

    /// Unknown or missing values fall back to `24h`; never an error.
    pub fn normalize(input: Option<&str>) -> Self {
        input.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfDay => "12h",
            Self::Day => "24h",
            Self::ThreeDays => "3d",
            Self::Week => "1w",
        }
    }

    /// Provider sampling interval.
    pub fn interval(&self) -> &'static str {
        match self {
            Self::HalfDay => "5m",
            Self::Day => "15m",
            Self::ThreeDays => "1h",
            Self::Week => "1d",
        }
    }

    /// Provider lookback range.
    pub fn range(&self) -> &'static str {
        match self {
            Self::HalfDay | Self::Day => "1d",
            Self::ThreeDays => "3d",
            Self::Week => "1wk",
        }
    }

    pub fn risk_multiplier(&self) -> f64 {
        match self {
            Self::HalfDay => 1.0,
            Self::Day => 1.5,
            Self::ThreeDays => 2.0,
            Self::Week => 3.0,
        }
    }

    pub fn expiration_offset(&self) -> chrono::Duration {
        match self {
            Self::HalfDay => chrono::Duration::hours(12),
            Self::Day => chrono::Duration::hours(24),
            Self::ThreeDays => chrono::Duration::days(3),
            Self::Week => chrono::Duration::days(7),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_values_normalize_to_24h() {
        for bad in ["", "2h", "24H", "1d", "week", "garbage"] {
            assert_eq!(Timeframe::normalize(Some(bad)), Timeframe::Day, "input {bad:?}");
        }
        assert_eq!(Timeframe::normalize(None), Timeframe::Day);
    }

    #[test]
    fn valid_values_round_trip_through_as_str() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::parse(tf.as_str()), Some(tf));
            assert_eq!(Timeframe::normalize(Some(tf.as_str())), tf);
        }
    }

    #[test]
    fn provider_sampling_table() {
        assert_eq!((Timeframe::HalfDay.interval(), Timeframe::HalfDay.range()), ("5m", "1d"));
        assert_eq!((Timeframe::Day.interval(), Timeframe::Day.range()), ("15m", "1d"));
        assert_eq!((Timeframe::ThreeDays.interval(), Timeframe::ThreeDays.range()), ("1h", "3d"));
        assert_eq!((Timeframe::Week.interval(), Timeframe::Week.range()), ("1d", "1wk"));
    }

    #[test]
    fn serializes_as_short_label() {
        assert_eq!(serde_json::to_value(Timeframe::Week).unwrap(), "1w");
        assert_eq!(serde_json::to_value(Timeframe::HalfDay).unwrap(), "12h");
    }

    #[test]
    fn expiration_offsets() {
        assert_eq!(Timeframe::HalfDay.expiration_offset().num_hours(), 12);
        assert_eq!(Timeframe::Day.expiration_offset().num_hours(), 24);
        assert_eq!(Timeframe::ThreeDays.expiration_offset().num_days(), 3);
        assert_eq!(Timeframe::Week.expiration_offset().num_days(), 7);
    }
}
