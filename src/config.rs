//! Configuration loading
//!
//! The file is resolved in two phases: `${NAME}` placeholders are replaced in
//! the raw text first, then the result is parsed. A malformed placeholder is
//! therefore a parse error, never a substitution error.

use crate::error::{BotError, Result};
use config::{File, FileFormat};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error, info};

/// Default SQLite database next to the working directory
pub const DEFAULT_DATABASE_URL: &str = "sqlite://pumpfun_migrated_coins.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub trading: TradingConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    /// Sections consumed elsewhere (API keys etc.), kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Fraction of capital at risk
    pub risk_limit: f64,
    /// Cutoff in [0, 1] for BUY/SELL classification
    pub sentiment_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(deserialize_with = "string_or_empty")]
    pub bot_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

impl DatabaseConfig {
    /// Connection string with `~` expanded in the file path
    pub fn resolved_url(&self) -> String {
        match self.url.strip_prefix("sqlite://") {
            Some(path) => format!("sqlite://{}", shellexpand::tilde(path)),
            None => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor_secs: f64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor_secs: default_backoff_factor(),
            timeout_secs: default_timeout(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

impl FetchConfig {
    pub fn backoff_factor(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_factor_secs.max(0.0))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Source of migration events for one ingestion cycle
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl FeedConfig {
    pub fn query(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_backoff_factor() -> f64 {
    0.2
}
fn default_timeout() -> u64 {
    30
}
fn default_retry_statuses() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

/// An unquoted placeholder that resolved to nothing parses as null
fn string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Config {
    /// Load configuration, resolving placeholders from the OS environment
    /// and then from `.env` in the working directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_logged(path.as_ref(), read_dotenv())
    }

    /// Like [`Config::load`] with an explicit `.env` file. A missing file
    /// leaves only the OS environment.
    pub fn load_with_env_file(
        path: impl AsRef<Path>,
        env_file: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::load_logged(path.as_ref(), read_dotenv_file(env_file.as_ref()))
    }

    fn load_logged(path: &Path, dotenv: HashMap<String, String>) -> Result<Self> {
        match Self::load_with(path, env_lookup(dotenv)) {
            Ok(config) => {
                info!("Configuration loaded successfully from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration from {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Load with an explicit variable lookup
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let text = substitute_env(&raw, lookup);
        Self::parse(&text, format_for(path))
    }

    /// Parse already-substituted text
    pub fn parse(text: &str, format: FileFormat) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(File::from_str(text, format))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let t = &self.trading;
        if !(0.0..=1.0).contains(&t.sentiment_threshold) {
            return Err(BotError::Config(format!(
                "trading.sentiment_threshold must be within [0, 1], got {}",
                t.sentiment_threshold
            )));
        }
        if !(0.0..=1.0).contains(&t.risk_limit) {
            return Err(BotError::Config(format!(
                "trading.risk_limit must be within [0, 1], got {}",
                t.risk_limit
            )));
        }
        Ok(())
    }
}

/// Free-function form of [`Config::load`]
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    Config::load(path)
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("placeholder pattern is valid"))
}

/// Replace every `${NAME}` in `raw`. Unknown names become empty text.
pub fn substitute_env<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    placeholder()
        .replace_all(raw, |caps: &Captures| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| {
                debug!("Config placeholder ${{{}}} is unset, using empty string", name);
                String::new()
            })
        })
        .into_owned()
}

/// Placeholder lookup: the OS environment wins, `.env` entries fill the gaps
pub fn env_lookup(dotenv: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |name: &str| std::env::var(name).ok().or_else(|| dotenv.get(name).cloned())
}

/// `.env` entries without touching the process environment
fn read_dotenv() -> HashMap<String, String> {
    match dotenvy::dotenv_iter() {
        Ok(iter) => iter.filter_map(|item| item.ok()).collect(),
        Err(_) => HashMap::new(),
    }
}

/// Entries of a specific `.env` file; empty when it cannot be read
pub fn read_dotenv_file(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(iter) => iter.filter_map(|item| item.ok()).collect(),
        Err(e) => {
            debug!("No .env entries from {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

fn format_for(path: &Path) -> FileFormat {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("toml") => FileFormat::Toml,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}
