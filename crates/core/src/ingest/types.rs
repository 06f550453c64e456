//! Provider response schemas. Every nested field is optional; accessors
//! return a documented default instead of failing.

use serde::Deserialize;

pub const DEFAULT_CURRENCY: &str = "USD";

// ---- chart: chart.result[0].{meta, timestamp, indicators.quote[0].close} ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartResponse {
    pub chart: Option<ChartBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartResult {
    pub meta: Option<ChartMeta>,
    pub timestamp: Option<Vec<Option<i64>>>,
    pub indicators: Option<ChartIndicators>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartMeta {
    pub regular_market_price: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartIndicators {
    pub quote: Option<Vec<QuoteArrays>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteArrays {
    pub close: Option<Vec<Option<f64>>>,
}

impl ChartResponse {
    /// First chart result, if any.
    pub fn first_result(&self) -> Option<&ChartResult> {
        self.chart.as_ref()?.result.as_ref()?.first()
    }

    /// Provider-side error description (`chart.error`), if it reported one.
    pub fn error_description(&self) -> Option<String> {
        let err = self.chart.as_ref()?.error.as_ref()?;
        if err.is_null() {
            return None;
        }
        Some(
            err.get("description")
                .and_then(|d| d.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
        )
    }
}

impl ChartResult {
    pub fn regular_market_price(&self) -> Option<f64> {
        self.meta.as_ref()?.regular_market_price
    }

    /// Defaults to USD.
    pub fn currency(&self) -> String {
        self.meta
            .as_ref()
            .and_then(|m| m.currency.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string()
    }

    /// Epoch seconds; empty when absent.
    pub fn timestamps(&self) -> &[Option<i64>] {
        self.timestamp.as_deref().unwrap_or(&[])
    }

    /// Closing prices with provider gaps kept as `None`; empty when absent.
    pub fn closes(&self) -> &[Option<f64>] {
        self.indicators
            .as_ref()
            .and_then(|i| i.quote.as_ref())
            .and_then(|q| q.first())
            .and_then(|q| q.close.as_deref())
            .unwrap_or(&[])
    }
}

// ---- insights: finance.result.instrumentInfo.{technicalEvents, keyTechnicals} ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InsightsResponse {
    pub finance: Option<FinanceBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FinanceBody {
    pub result: Option<InsightsResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsightsResult {
    pub instrument_info: Option<InstrumentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub technical_events: Option<TechnicalEvents>,
    pub key_technicals: Option<KeyTechnicals>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TechnicalEvents {
    pub short_term_outlook: Option<OutlookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutlookEntry {
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyTechnicals {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl InsightsResponse {
    fn instrument_info(&self) -> Option<&InstrumentInfo> {
        self.finance.as_ref()?.result.as_ref()?.instrument_info.as_ref()
    }

    pub fn short_term_direction(&self) -> Option<&str> {
        self.instrument_info()?
            .technical_events
            .as_ref()?
            .short_term_outlook
            .as_ref()?
            .direction
            .as_deref()
    }

    pub fn support(&self) -> Option<f64> {
        self.instrument_info()?
            .key_technicals
            .as_ref()?
            .support
            .filter(|v| v.is_finite())
    }

    pub fn resistance(&self) -> Option<f64> {
        self.instrument_info()?
            .key_technicals
            .as_ref()?
            .resistance
            .filter(|v| v.is_finite())
    }
}
