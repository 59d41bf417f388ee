use anyhow::{Context, Result};
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "TALLY_ADVISOR_MODEL";
pub const BASE_URL_VAR: &str = "TALLY_ADVISOR_BASE_URL";
pub const TIMEOUT_VAR: &str = "TALLY_ADVISOR_TIMEOUT_SECS";

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the advisory relay, resolved from the environment at startup.
#[derive(Clone)]
pub struct AdvisorConfig {
    /// Credential for the chat-completion service. `None` disables the advisor.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// Never print the credential.
impl std::fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AdvisorConfig {
    /// Override the request timeout (e.g. from `--timeout-secs`).
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }
}

/// Load config from the process environment. A `.env` file in the working
/// directory is read first when present.
pub fn load_config() -> Result<AdvisorConfig> {
    dotenv::dotenv().ok();
    config_from(|k| std::env::var(k).ok())
}

pub fn config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<AdvisorConfig> {
    let mut cfg = AdvisorConfig::default();
    let non_empty = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    cfg.api_key = non_empty(API_KEY_VAR);
    if let Some(model) = non_empty(MODEL_VAR) {
        cfg.model = model;
    }
    if let Some(url) = non_empty(BASE_URL_VAR) {
        cfg.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = non_empty(TIMEOUT_VAR) {
        let secs: u64 = secs
            .parse()
            .with_context(|| format!("{TIMEOUT_VAR} must be a whole number of seconds, got {secs:?}"))?;
        cfg.timeout = Duration::from_secs(secs);
    }
    Ok(cfg)
}
