use crate::config::Settings;
use crate::domain::Timeframe;
use crate::ingest::provider::{QuoteBundle, QuoteError, QuoteSource};
use crate::ingest::types::{ChartResponse, InsightsResponse};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CHART_PATH: &str = "/v8/finance/chart";
const INSIGHTS_PATH: &str = "/v1/finance/insights";

/// Chart + insights client for the Yahoo Finance public endpoints.
#[derive(Debug, Clone)]
pub struct YahooQuoteSource {
    http: reqwest::Client,
    base_url: String,
    retries: u32,
}

impl YahooQuoteSource {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        // The provider rejects requests without a browser-like agent.
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.quote_user_agent)
                .context("QUOTE_USER_AGENT is not a valid header value")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.quote_timeout_secs))
            .build()
            .context("failed to build quote http client")?;

        Ok(Self {
            http,
            base_url: settings.quote_base_url.trim_end_matches('/').to_string(),
            retries: settings.quote_retries.max(1),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!("{}{}/{}", self.base_url, CHART_PATH, symbol)
    }

    fn insights_url(&self) -> String {
        format!("{}{}", self.base_url, INSIGHTS_PATH)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        symbol: &str,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, QuoteError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| QuoteError::Network {
                symbol: symbol.to_string(),
                source,
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|source| QuoteError::Network {
            symbol: symbol.to_string(),
            source,
        })?;

        if !status.is_success() {
            tracing::debug!(%symbol, http_status = %status, body = %truncate(&text, 200), "quote provider error body");
            return Err(QuoteError::Http {
                symbol: symbol.to_string(),
                status,
            });
        }

        serde_json::from_str::<T>(&text)
            .map_err(|e| QuoteError::malformed(symbol, format!("invalid JSON: {e}")))
    }

    async fn fetch_chart_once(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<ChartResponse, QuoteError> {
        let query = [
            ("interval", timeframe.interval()),
            ("range", timeframe.range()),
            ("includePrePost", "true"),
        ];
        self.get_json(symbol, self.chart_url(symbol), &query).await
    }

    async fn fetch_chart(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<ChartResponse, QuoteError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_chart_once(symbol, timeframe).await {
                Ok(chart) => return Ok(chart),
                Err(err) => {
                    if !err.is_retryable() || attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %symbol, error = %err, "chart fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn fetch_insights(&self, symbol: &str) -> Result<InsightsResponse, QuoteError> {
        self.get_json(symbol, self.insights_url(), &[("symbol", symbol)])
            .await
    }
}

#[async_trait::async_trait]
impl QuoteSource for YahooQuoteSource {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<QuoteBundle, QuoteError> {
        let (chart, insights) =
            tokio::join!(self.fetch_chart(symbol, timeframe), self.fetch_insights(symbol));

        let chart = match chart {
            Ok(chart) => chart,
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "chart fetch failed; skipping instrument");
                return Err(err);
            }
        };

        let insights = match insights {
            Ok(insights) => Some(insights),
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "insights unavailable; continuing without provider technicals");
                None
            }
        };

        let Some(result) = chart.first_result() else {
            let detail = chart
                .error_description()
                .unwrap_or_else(|| "chart.result is empty".to_string());
            let err = QuoteError::malformed(symbol, detail);
            tracing::warn!(%symbol, error = %err, "chart response unusable; skipping instrument");
            return Err(err);
        };

        QuoteBundle::from_provider(symbol, result, insights.as_ref()).inspect_err(|err| {
            tracing::warn!(%symbol, error = %err, "chart response unusable; skipping instrument");
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
