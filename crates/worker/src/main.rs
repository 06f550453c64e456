use clap::Parser;
use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tradesignal_core::domain::RecommendationSet;
use tradesignal_core::engine::{parse_asset_list, RecommendationEngine};

#[derive(Debug, Parser)]
#[command(name = "tradesignal_worker")]
struct Args {
    /// Analysis horizon: 12h, 24h, 3d or 1w. Anything else runs as 24h.
    #[arg(long)]
    timeframe: Option<String>,

    /// Comma-separated symbols (e.g. AAPL,BTC-USD). Defaults to the standard selection.
    #[arg(long)]
    assets: Option<String>,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradesignal_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, &args).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "recommendation run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &tradesignal_core::config::Settings, args: &Args) -> anyhow::Result<()> {
    let engine = RecommendationEngine::from_settings(settings)?;
    let assets = args.assets.as_deref().map(parse_asset_list);

    let set = engine
        .get_recommendations(args.timeframe.as_deref(), assets.as_deref())
        .await;

    tracing::info!(
        timeframe = %set.timeframe,
        count = set.count,
        "recommendation run complete"
    );

    println!("{}", render(&set, args.pretty)?);
    Ok(())
}

fn render(set: &RecommendationSet, pretty: bool) -> anyhow::Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(set)
    } else {
        serde_json::to_string(set)
    };
    out.context("failed to serialize recommendation set")
}

fn init_sentry(settings: &tradesignal_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradesignal_core::domain::Timeframe;

    #[test]
    fn parses_cli_flags() {
        let args = Args::parse_from([
            "tradesignal_worker",
            "--timeframe",
            "3d",
            "--assets",
            "AAPL,GC=F",
            "--pretty",
        ]);
        assert_eq!(args.timeframe.as_deref(), Some("3d"));
        assert_eq!(args.assets.as_deref(), Some("AAPL,GC=F"));
        assert!(args.pretty);

        let args = Args::parse_from(["tradesignal_worker"]);
        assert!(args.timeframe.is_none() && args.assets.is_none() && !args.pretty);
    }

    #[test]
    fn renders_empty_set() {
        let set = RecommendationSet::new(chrono::Local::now(), Timeframe::ThreeDays, Vec::new());
        let compact = render(&set, false).unwrap();
        let v: serde_json::Value = serde_json::from_str(&compact).unwrap();
        assert_eq!(v["timeframe"], "3d");
        assert_eq!(v["count"], 0);
        assert!(render(&set, true).unwrap().contains('\n'));
    }
}
