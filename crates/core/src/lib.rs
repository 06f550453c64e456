pub mod analysis;
pub mod domain;
pub mod engine;
pub mod ingest;
pub mod time;

pub mod config {
    const DEFAULT_PORT: u16 = 5000;
    const DEFAULT_STATIC_DIR: &str = "frontend";
    const DEFAULT_QUOTE_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
    const DEFAULT_QUOTE_TIMEOUT_SECS: u64 = 6;
    const DEFAULT_QUOTE_RETRIES: u32 = 2;
    const DEFAULT_QUOTE_CONCURRENCY: usize = 4;
    const DEFAULT_INSTRUMENT_TIMEOUT_SECS: u64 = 15;
    const DEFAULT_PER_CLASS: usize = 2;
    const DEFAULT_ASSET_CAP: usize = 8;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub static_dir: String,
        pub sentry_dsn: Option<String>,
        pub quote_base_url: String,
        pub quote_user_agent: String,
        pub quote_timeout_secs: u64,
        pub quote_retries: u32,
        pub quote_concurrency: usize,
        pub instrument_timeout_secs: u64,
        pub default_per_class: usize,
        pub default_asset_cap: usize,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                port: DEFAULT_PORT,
                static_dir: DEFAULT_STATIC_DIR.to_string(),
                sentry_dsn: None,
                quote_base_url: DEFAULT_QUOTE_BASE_URL.to_string(),
                quote_user_agent: DEFAULT_USER_AGENT.to_string(),
                quote_timeout_secs: DEFAULT_QUOTE_TIMEOUT_SECS,
                quote_retries: DEFAULT_QUOTE_RETRIES,
                quote_concurrency: DEFAULT_QUOTE_CONCURRENCY,
                instrument_timeout_secs: DEFAULT_INSTRUMENT_TIMEOUT_SECS,
                default_per_class: DEFAULT_PER_CLASS,
                default_asset_cap: DEFAULT_ASSET_CAP,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            Ok(Self {
                port: parsed_var("PORT").unwrap_or(defaults.port),
                static_dir: non_empty_var("STATIC_DIR").unwrap_or(defaults.static_dir),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                quote_base_url: non_empty_var("QUOTE_BASE_URL").unwrap_or(defaults.quote_base_url),
                quote_user_agent: non_empty_var("QUOTE_USER_AGENT")
                    .unwrap_or(defaults.quote_user_agent),
                quote_timeout_secs: parsed_var("QUOTE_TIMEOUT_SECS")
                    .unwrap_or(defaults.quote_timeout_secs),
                quote_retries: parsed_var("QUOTE_RETRIES").unwrap_or(defaults.quote_retries),
                quote_concurrency: parsed_var("QUOTE_CONCURRENCY")
                    .unwrap_or(defaults.quote_concurrency),
                instrument_timeout_secs: parsed_var("INSTRUMENT_TIMEOUT_SECS")
                    .unwrap_or(defaults.instrument_timeout_secs),
                default_per_class: parsed_var("DEFAULT_PER_CLASS")
                    .unwrap_or(defaults.default_per_class),
                default_asset_cap: parsed_var("DEFAULT_ASSET_CAP")
                    .unwrap_or(defaults.default_asset_cap),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
        non_empty_var(key).and_then(|s| s.parse::<T>().ok())
    }

}
