use crate::analysis::indicators;
use crate::analysis::signal::{self, SignalInput};
use crate::config::Settings;
use crate::domain::{Instrument, InstrumentRegistry, Recommendation, RecommendationSet, Timeframe};
use crate::ingest::{QuoteBundle, QuoteSource, YahooQuoteSource};
use chrono::{DateTime, Local};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Max quote fetches in flight per request.
    pub concurrency: usize,
    /// Upper bound for one instrument's fetch, retries included.
    pub instrument_timeout: Duration,
    pub default_per_class: usize,
    pub default_asset_cap: usize,
}

impl EngineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            concurrency: settings.quote_concurrency.max(1),
            instrument_timeout: Duration::from_secs(settings.instrument_timeout_secs.max(1)),
            default_per_class: settings.default_per_class,
            default_asset_cap: settings.default_asset_cap,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Turns a timeframe and an optional symbol list into a ranked
/// recommendation set. Owns the registry and the quote source; holds no
/// per-request state.
pub struct RecommendationEngine {
    registry: InstrumentRegistry,
    source: Arc<dyn QuoteSource>,
    options: EngineOptions,
}

impl RecommendationEngine {
    pub fn new(
        registry: InstrumentRegistry,
        source: Arc<dyn QuoteSource>,
        options: EngineOptions,
    ) -> Self {
        Self {
            registry,
            source,
            options,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let source = YahooQuoteSource::from_settings(settings)?;
        Ok(Self::new(
            InstrumentRegistry::builtin(),
            Arc::new(source),
            EngineOptions::from_settings(settings),
        ))
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    /// Raw-input entry point: the timeframe is normalized (unknown → 24h)
    /// and `assets` follows [`Self::select_instruments`].
    pub async fn get_recommendations(
        &self,
        timeframe: Option<&str>,
        assets: Option<&[String]>,
    ) -> RecommendationSet {
        self.recommend(Timeframe::normalize(timeframe), assets, Local::now())
            .await
    }

    pub async fn recommend(
        &self,
        timeframe: Timeframe,
        assets: Option<&[String]>,
        now: DateTime<Local>,
    ) -> RecommendationSet {
        let selected = self.select_instruments(assets);
        let requested = selected.len();

        let instruments: Vec<Instrument> = selected.into_iter().cloned().collect();
        let mut recommendations: Vec<Recommendation> = futures::stream::iter(instruments)
            .map(|inst| self.evaluate(inst, timeframe, now))
            .buffered(self.options.concurrency.max(1))
            .filter_map(|r| async move { r })
            .collect()
            .await;

        rank(&mut recommendations);

        tracing::info!(
            %timeframe,
            provider = self.source.provider_name(),
            requested,
            produced = recommendations.len(),
            skipped = requested - recommendations.len(),
            "recommendations generated"
        );

        RecommendationSet::new(now, timeframe, recommendations)
    }

    /// With no (or an empty) list, the default selection: the first
    /// `default_per_class` instruments of every asset class, capped at
    /// `default_asset_cap`. Otherwise the requested symbols in request order,
    /// trimmed and de-duplicated, dropping ones the registry does not know.
    pub fn select_instruments(&self, assets: Option<&[String]>) -> Vec<&Instrument> {
        let requested: Vec<&str> = assets
            .unwrap_or(&[])
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if requested.is_empty() {
            return self
                .registry
                .default_selection(self.options.default_per_class, self.options.default_asset_cap);
        }

        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(requested.len());
        for symbol in requested {
            match self.registry.get(symbol) {
                Some(inst) => {
                    if seen.insert(symbol) {
                        out.push(inst);
                    }
                }
                None => tracing::debug!(%symbol, "unknown symbol requested; skipping"),
            }
        }
        out
    }

    async fn evaluate(
        &self,
        inst: Instrument,
        timeframe: Timeframe,
        now: DateTime<Local>,
    ) -> Option<Recommendation> {
        let fetched = tokio::time::timeout(
            self.options.instrument_timeout,
            self.source.fetch(&inst.symbol, timeframe),
        )
        .await;

        match fetched {
            Ok(Ok(bundle)) => Some(build_recommendation(&inst, &bundle, timeframe, now)),
            Ok(Err(err)) => {
                tracing::debug!(symbol = %inst.symbol, error = %err, "instrument skipped");
                None
            }
            Err(_) => {
                tracing::warn!(
                    symbol = %inst.symbol,
                    timeout = ?self.options.instrument_timeout,
                    "quote fetch timed out; skipping instrument"
                );
                None
            }
        }
    }
}

/// Runs the indicator and signal stages over one fetched bundle.
pub fn build_recommendation(
    inst: &Instrument,
    bundle: &QuoteBundle,
    timeframe: Timeframe,
    now: DateTime<Local>,
) -> Recommendation {
    let closes = bundle.series.valid_closes();
    let indicator_set = indicators::compute(&closes);
    let trend = indicators::trend(&closes);
    let volatility = indicators::volatility(&closes);
    let price = bundle.current_price;

    let sig = signal::synthesize(
        SignalInput {
            price,
            indicators: &indicator_set,
            trend,
            volatility,
            timeframe,
            outlook: bundle.outlook,
        },
        now,
    );
    let (support, resistance) =
        signal::support_resistance(price, bundle.support, bundle.resistance);

    Recommendation {
        symbol: inst.symbol.clone(),
        name: inst.name.clone(),
        asset_class: inst.asset_class,
        current_price: price,
        currency: bundle.currency.clone(),
        trend,
        action: sig.action,
        confidence: sig.confidence,
        entry_price: price,
        stop_loss: sig.stop_loss,
        take_profit: sig.take_profit,
        potential_percent: signal::round2(sig.potential_percent),
        support,
        resistance,
        expiration: sig.expiration,
        timeframe,
        indicators: indicator_set,
    }
}

/// Highest confidence first, then largest potential. Stable, so ties keep
/// request order.
pub fn rank(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(|a, b| {
        a.confidence
            .rank()
            .cmp(&b.confidence.rank())
            .then_with(|| {
                b.potential_percent
                    .partial_cmp(&a.potential_percent)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Splits a comma-separated `assets` parameter.
pub fn parse_asset_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Action, AssetClass, Confidence, Outlook, Trend};
    use crate::ingest::{PriceSeries, QuoteError};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone)]
    enum Behavior {
        Quote(QuoteBundle),
        Fail,
        Hang,
    }

    #[derive(Default)]
    struct StubSource {
        behaviors: HashMap<String, Behavior>,
        calls: Mutex<Vec<(String, Timeframe)>>,
    }

    impl StubSource {
        fn with(mut self, symbol: &str, behavior: Behavior) -> Self {
            self.behaviors.insert(symbol.to_string(), behavior);
            self
        }
    }

    #[async_trait::async_trait]
    impl QuoteSource for StubSource {
        fn provider_name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, symbol: &str, timeframe: Timeframe) -> Result<QuoteBundle, QuoteError> {
            self.calls
                .lock()
                .unwrap()
                .push((symbol.to_string(), timeframe));
            match self.behaviors.get(symbol).cloned() {
                Some(Behavior::Quote(b)) => Ok(b),
                Some(Behavior::Hang) => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Err(QuoteError::malformed(symbol, "unreachable"))
                }
                Some(Behavior::Fail) => Err(QuoteError::malformed(symbol, "stub failure")),
                None => Ok(ramp_bundle(symbol, None)),
            }
        }
    }

    fn ramp_bundle(symbol: &str, outlook: Option<Outlook>) -> QuoteBundle {
        QuoteBundle {
            symbol: symbol.to_string(),
            current_price: 110.0,
            currency: "USD".to_string(),
            series: PriceSeries::from_closes((100..=110).map(|p| Some(p as f64))),
            support: None,
            resistance: None,
            outlook,
        }
    }

    fn falling_bundle(symbol: &str) -> QuoteBundle {
        QuoteBundle {
            symbol: symbol.to_string(),
            current_price: 90.0,
            currency: "USD".to_string(),
            series: PriceSeries::from_closes((90..=110).rev().map(|p| Some(p as f64))),
            support: Some(85.0),
            resistance: Some(100.0),
            outlook: Some(Outlook::Down),
        }
    }

    fn engine(source: StubSource) -> RecommendationEngine {
        engine_with(source, EngineOptions::default())
    }

    fn engine_with(source: StubSource, options: EngineOptions) -> RecommendationEngine {
        RecommendationEngine::new(InstrumentRegistry::builtin(), Arc::new(source), options)
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn rec(symbol: &str, confidence: Confidence, potential: f64) -> Recommendation {
        Recommendation {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            asset_class: AssetClass::Stock,
            current_price: 100.0,
            currency: "USD".to_string(),
            trend: Trend::Bullish,
            action: Action::Buy,
            confidence,
            entry_price: 100.0,
            stop_loss: 99.0,
            take_profit: 100.0 + potential,
            potential_percent: potential,
            support: 95.0,
            resistance: 105.0,
            expiration: now(),
            timeframe: Timeframe::Day,
            indicators: Default::default(),
        }
    }

    #[tokio::test]
    async fn empty_assets_fall_back_to_default_selection() {
        let eng = engine(StubSource::default());
        let set = eng.get_recommendations(Some("1w"), Some(&[])).await;
        assert_eq!(set.timeframe, Timeframe::Week);
        assert_eq!(set.count, 8);
        assert_eq!(set.recommendations.len(), 8);
        assert!(set.recommendations.iter().all(|r| r.timeframe == Timeframe::Week));

        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v["timeframe"], "1w");

        let none = eng.get_recommendations(Some("1w"), None).await;
        assert_eq!(none.count, 8);
    }

    #[tokio::test]
    async fn invalid_timeframe_is_coerced_and_passed_to_source() {
        let source = Arc::new(StubSource::default());
        let eng = RecommendationEngine::new(
            InstrumentRegistry::builtin(),
            source.clone(),
            EngineOptions::default(),
        );
        let set = eng
            .get_recommendations(Some("5y"), Some(&symbols(&["AAPL"])))
            .await;
        assert_eq!(set.timeframe, Timeframe::Day);
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("AAPL".to_string(), Timeframe::Day)]);
    }

    #[tokio::test]
    async fn timed_out_instrument_is_omitted() {
        let source = StubSource::default().with("MSFT", Behavior::Hang);
        let options = EngineOptions {
            instrument_timeout: Duration::from_millis(50),
            ..EngineOptions::default()
        };
        let eng = engine_with(source, options);

        let set = eng
            .recommend(
                Timeframe::Day,
                Some(&symbols(&["AAPL", "MSFT", "BTC-USD", "GC=F"])),
                now(),
            )
            .await;

        assert_eq!(set.count, 3);
        let got: HashSet<&str> = set.recommendations.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(got, HashSet::from(["AAPL", "BTC-USD", "GC=F"]));
    }

    #[tokio::test]
    async fn failures_and_unknown_symbols_are_skipped() {
        let source = StubSource::default().with("TSLA", Behavior::Fail);
        let eng = engine(source);
        let set = eng
            .recommend(
                Timeframe::ThreeDays,
                Some(&symbols(&["NOPE", " AAPL ", "TSLA", "AAPL", ""])),
                now(),
            )
            .await;
        assert_eq!(set.count, 1);
        assert_eq!(set.recommendations[0].symbol, "AAPL");
    }

    #[tokio::test]
    async fn all_failures_give_well_formed_empty_set() {
        let source = StubSource::default()
            .with("AAPL", Behavior::Fail)
            .with("MSFT", Behavior::Fail);
        let eng = engine(source);
        let set = eng
            .recommend(Timeframe::HalfDay, Some(&symbols(&["AAPL", "MSFT"])), now())
            .await;
        assert_eq!(set.count, 0);
        assert_eq!(set.timeframe, Timeframe::HalfDay);
        assert_eq!(set.generated_at, now());
    }

    #[tokio::test]
    async fn results_are_ranked_by_confidence_then_potential() {
        let source = StubSource::default()
            .with("AAPL", Behavior::Quote(ramp_bundle("AAPL", None)))
            .with("MSFT", Behavior::Quote(ramp_bundle("MSFT", Some(Outlook::Up))))
            .with("ETH-USD", Behavior::Quote(falling_bundle("ETH-USD")));
        let eng = engine(source);
        let set = eng
            .recommend(Timeframe::Day, Some(&symbols(&["AAPL", "MSFT", "ETH-USD"])), now())
            .await;

        assert_eq!(set.count, 3);
        let keys: Vec<(u8, f64)> = set
            .recommendations
            .iter()
            .map(|r| (r.confidence.rank(), r.potential_percent))
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0].0 < pair[1].0 || (pair[0].0 == pair[1].0 && pair[0].1 >= pair[1].1));
        }
        // Plain ramp scores only the SMA point.
        assert_eq!(set.recommendations.last().unwrap().symbol, "AAPL");
        assert_eq!(set.recommendations.last().unwrap().confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn recommendations_run_on_a_spawned_task() {
        let eng = Arc::new(engine(StubSource::default()));
        let task = tokio::spawn({
            let eng = eng.clone();
            async move {
                let assets = symbols(&["AAPL", "BTC-USD"]);
                eng.get_recommendations(Some("3d"), Some(&assets)).await
            }
        });
        let set = task.await.unwrap();
        assert_eq!(set.timeframe, Timeframe::ThreeDays);
        assert_eq!(set.count, 2);
    }

    #[test]
    fn ramp_recommendation_matches_scenario() {
        let inst = Instrument::new("AAPL", "Apple Inc.", AssetClass::Stock);
        let r = build_recommendation(&inst, &ramp_bundle("AAPL", None), Timeframe::Day, now());

        assert_eq!(r.trend, Trend::Bullish);
        assert_eq!(r.indicators.sma_short, Some(108.0));
        assert_eq!(r.indicators.sma_medium, Some(105.5));
        assert_eq!(r.confidence, Confidence::Low);
        assert_eq!(r.action, Action::Buy);
        assert_eq!(r.entry_price, 110.0);
        assert!(r.stop_loss < 110.0 && r.take_profit > 110.0);
        assert!(r.potential_percent > 0.0);
        assert_eq!(r.support, 110.0 * 0.95);
        assert_eq!(r.resistance, 110.0 * 1.05);
        assert_eq!(r.expiration, now() + chrono::Duration::hours(24));
    }

    #[test]
    fn falling_series_with_down_outlook_sells() {
        let inst = Instrument::new("ETH-USD", "Ethereum USD", AssetClass::Crypto);
        let r = build_recommendation(&inst, &falling_bundle("ETH-USD"), Timeframe::Week, now());
        assert_eq!(r.trend, Trend::Bearish);
        // SMA point + agreeing outlook; RSI 0 and positive MACD do not count.
        assert_eq!(r.confidence, Confidence::Medium);
        assert_eq!(r.action, Action::Sell);
        assert!(r.stop_loss > 90.0 && r.take_profit < 90.0);
        assert_eq!((r.support, r.resistance), (85.0, 100.0));
    }

    #[test]
    fn degenerate_series_uses_defaults() {
        let inst = Instrument::new("GC=F", "Gold", AssetClass::Commodity);
        let bundle = QuoteBundle {
            series: PriceSeries::from_closes([None, Some(2000.0)]),
            current_price: 2000.0,
            ..ramp_bundle("GC=F", None)
        };
        let r = build_recommendation(&inst, &bundle, Timeframe::HalfDay, now());
        assert_eq!(r.trend, Trend::Neutral);
        assert!(r.indicators.is_empty());
        assert_eq!(r.action, Action::Sell);
        // default volatility 0.02 -> SL +4%, TP -6%
        assert_eq!(r.stop_loss, 2080.0);
        assert_eq!(r.take_profit, 1880.0);
        assert_eq!(r.potential_percent, 6.0);
    }

    #[test]
    fn higher_confidence_always_sorts_first() {
        let mut recs = vec![
            rec("A", Confidence::Low, 50.0),
            rec("B", Confidence::High, 0.5),
            rec("C", Confidence::Medium, 10.0),
            rec("D", Confidence::High, 3.0),
            rec("E", Confidence::Medium, 10.0),
        ];
        rank(&mut recs);
        let order: Vec<&str> = recs.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["D", "B", "C", "E", "A"]);
    }

    #[test]
    fn parses_comma_separated_assets() {
        assert_eq!(parse_asset_list("AAPL, BTC-USD,,GC=F "), symbols(&["AAPL", "BTC-USD", "GC=F"]));
        assert!(parse_asset_list(" , ").is_empty());
    }
}
