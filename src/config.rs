use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{runtime, session};
use crate::data::SessionClock;
use crate::error::ConfigError;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Local session close, "HH:MM"
    pub close_time: String,
    pub utc_offset_minutes: i32,
    /// Minutes either side of the close in which `daily_close` is decidable
    pub close_window_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            close_time: session::DEFAULT_CLOSE_TIME.to_string(),
            utc_offset_minutes: session::DEFAULT_UTC_OFFSET_MINUTES,
            close_window_minutes: session::DEFAULT_CLOSE_WINDOW_MINUTES,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub bus_capacity: usize,
    /// Pending ticks per symbol worker before new ticks are dropped
    pub symbol_queue_size: usize,
    /// Bars requested from the history provider per evaluation
    pub history_lookback: usize,
    /// Bars retained per symbol by the in-memory store
    pub history_limit: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            bus_capacity: runtime::DEFAULT_BUS_CAPACITY,
            symbol_queue_size: runtime::DEFAULT_SYMBOL_QUEUE_SIZE,
            history_lookback: runtime::DEFAULT_HISTORY_LOOKBACK,
            history_limit: runtime::DEFAULT_HISTORY_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    /// Tried in order when the primary model fails
    pub fallback_models: Vec<String>,
    pub max_concurrent: usize,
    pub queue_size: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: runtime::DEFAULT_LLM_MODEL.to_string(),
            fallback_models: Vec::new(),
            max_concurrent: runtime::DEFAULT_LLM_MAX_CONCURRENT,
            queue_size: runtime::DEFAULT_LLM_QUEUE_SIZE,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Minimum seconds between notifications for one owner and symbol
    pub cooldown_secs: u64,
    pub telegram_bot_token: Option<String>,
    /// Explain triggers with the LLM; the template message is used otherwise
    pub explain_with_llm: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: runtime::DEFAULT_NOTIFY_COOLDOWN_SECS,
            telegram_bot_token: None,
            explain_with_llm: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub bind_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: runtime::DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub dispatcher: DispatcherConfig,
    pub llm: LlmConfig,
    pub notifications: NotificationConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Reads `config.yaml` from the working directory. A missing file yields
    /// the defaults; a malformed one is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new("config.yaml");
        let mut config = if path.exists() {
            Self::load_from(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Secrets from the environment win over the file.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.is_empty() {
                self.llm.base_url = Some(url);
            }
        }
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.is_empty() {
                self.notifications.telegram_bot_token = Some(token);
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.dispatcher;
        if d.bus_capacity == 0 || d.symbol_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "dispatcher bus_capacity and symbol_queue_size must be > 0".to_string(),
            ));
        }
        if d.history_lookback == 0 || d.history_limit < d.history_lookback {
            return Err(ConfigError::Invalid(format!(
                "dispatcher history_limit ({}) must be >= history_lookback ({}) > 0",
                d.history_limit, d.history_lookback
            )));
        }
        SessionClock::from_config(&self.session)?;
        if self.notifications.cooldown_secs > runtime::MAX_NOTIFY_COOLDOWN_SECS {
            return Err(ConfigError::Invalid(format!(
                "notifications cooldown_secs must be <= {}, got {}",
                runtime::MAX_NOTIFY_COOLDOWN_SECS,
                self.notifications.cooldown_secs
            )));
        }
        if self.llm.max_concurrent == 0 || self.llm.queue_size == 0 {
            return Err(ConfigError::Invalid(
                "llm max_concurrent and queue_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Primary model followed by the fallbacks, without duplicates.
    pub fn llm_models(&self) -> Vec<String> {
        let mut models = vec![self.llm.model.clone()];
        for m in &self.llm.fallback_models {
            if !models.contains(m) {
                models.push(m.clone());
            }
        }
        models
    }
}
