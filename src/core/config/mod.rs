use std::env;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-004";
pub const DEFAULT_INDEX_DIR: &str = "chroma";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },
}

/// Which query pipeline the server runs.
///
/// `SingleStage` answers straight from retrieved context; `TwoStage` runs
/// the Manager decision first and may augment with a web search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    SingleStage,
    TwoStage,
}

impl PipelineMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "single" | "single-stage" => Some(PipelineMode::SingleStage),
            "two-stage" | "advisor" => Some(PipelineMode::TwoStage),
            _ => None,
        }
    }
}

/// Process configuration, read once at startup from the environment.
///
/// The LLM credential is the only hard requirement; the search credential is
/// optional and its absence degrades the web-search step only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub google_api_key: String,
    pub serpapi_api_key: Option<String>,
    pub index_dir: PathBuf,
    pub pipeline_mode: PipelineMode,
    pub gemini_model: String,
    pub embed_model: String,
    pub port: u16,
    pub log_dir: PathBuf,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    ///
    /// Injected so tests can supply variables without touching the process
    /// environment. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let google_api_key = get("GOOGLE_API_KEY")
            .ok_or(ConfigError::MissingVar("GOOGLE_API_KEY"))?;

        let pipeline_mode = match get("FINCHAT_PIPELINE_MODE") {
            Some(raw) => PipelineMode::parse(&raw).ok_or(ConfigError::InvalidVar {
                var: "FINCHAT_PIPELINE_MODE",
                value: raw,
            })?,
            None => PipelineMode::TwoStage,
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidVar {
                var: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let http_timeout_secs = match get("FINCHAT_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                var: "FINCHAT_HTTP_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(AppConfig {
            google_api_key,
            serpapi_api_key: get("SERPAPI_API_KEY"),
            index_dir: PathBuf::from(
                get("FINCHAT_INDEX_DIR").unwrap_or_else(|| DEFAULT_INDEX_DIR.to_string()),
            ),
            pipeline_mode,
            gemini_model: get("FINCHAT_GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            embed_model: get("FINCHAT_EMBED_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            port,
            log_dir: PathBuf::from(
                get("FINCHAT_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string()),
            ),
            http_timeout_secs,
        })
    }
}
