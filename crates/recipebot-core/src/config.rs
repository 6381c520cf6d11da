//! RecipeBot configuration system.
//!
//! Loaded from `~/.recipebot/config.toml` (or an explicit path), then
//! overridden by environment variables, then validated. Validation errors
//! are fatal before the scheduler starts.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecipeBotError, Result};

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHANNEL_ID";
pub const ENV_CATALOG: &str = "RECIPEBOT_CATALOG";
pub const ENV_IMAGE_API_KEY: &str = "OPENAI_API_KEY";

/// Telegram accepts 2..=10 poll options.
pub const MAX_POLL_OPTIONS: usize = 10;

/// Longest accepted interval cadence: one year.
pub const MAX_INTERVAL_HOURS: f64 = 24.0 * 365.0;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeBotConfig {
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub cadence: CadenceConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

impl RecipeBotConfig {
    /// Load config from the default path (~/.recipebot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecipeBotError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RecipeBotError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the RecipeBot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".recipebot")
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_BOT_TOKEN) {
            self.channel.bot_token = token;
        }
        if let Some(chat_id) = get(ENV_CHAT_ID) {
            self.channel.chat_id = chat_id;
        }
        if let Some(path) = get(ENV_CATALOG) {
            self.catalog.path = path;
        }
        if let Some(key) = get(ENV_IMAGE_API_KEY) {
            self.image.api_key = key;
        }
    }

    /// Check every required setting. `dry_run` skips the Telegram and image
    /// credentials, which the console channel never uses.
    pub fn validate(&self, dry_run: bool) -> Result<()> {
        let fail = |msg: &str| Err(RecipeBotError::Config(msg.to_string()));

        if !dry_run && self.channel.chat_id.trim().is_empty() {
            return fail("channel.chat_id is not set (or TELEGRAM_CHANNEL_ID)");
        }
        if !dry_run && self.channel.bot_token.trim().is_empty() {
            return fail("channel.bot_token is not set (or TELEGRAM_BOT_TOKEN)");
        }
        if self.catalog.path.trim().is_empty() {
            return fail("catalog.path is empty");
        }

        match self.cadence.mode {
            CadenceMode::Interval => {
                let hours = self.cadence.interval_hours;
                if !(hours.is_finite() && hours > 0.0 && hours <= MAX_INTERVAL_HOURS) {
                    return fail("cadence.interval_hours must be between 0 and 8760 (one year)");
                }
            }
            CadenceMode::Daily => {
                self.cadence.parsed_daily_times()?;
            }
        }

        if self.dispatch.request_timeout_secs == 0 {
            return fail("dispatch.request_timeout_secs must be at least 1");
        }

        match self.dispatch.shape {
            DispatchShape::Text => {}
            DispatchShape::Image => {
                if !dry_run && self.image.api_key.trim().is_empty() {
                    return fail("image.api_key is not set (or OPENAI_API_KEY)");
                }
            }
            DispatchShape::Poll => {
                if self.feedback.every == 0 {
                    return fail("feedback.every must be at least 1");
                }
                if self.feedback.question.trim().is_empty() {
                    return fail("feedback.question is empty");
                }
                if self.feedback.options.len() < 2 {
                    return fail("feedback.options needs at least two choices");
                }
                if self.feedback.options.len() > MAX_POLL_OPTIONS {
                    return fail("feedback.options allows at most 10 choices");
                }
            }
        }

        Ok(())
    }
}

/// Outbound channel settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Numeric chat id or `@channelusername`.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String { "https://api.telegram.org".into() }

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
        }
    }
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Catalog source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

fn default_catalog_path() -> String { "recipes.json".into() }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { path: default_catalog_path() }
    }
}

/// Which cadence strategy drives the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceMode {
    /// Wait a fixed number of hours after each dispatch.
    Interval,
    /// Fire at fixed clock times every day.
    Daily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "default_cadence_mode")]
    pub mode: CadenceMode,
    #[serde(default = "default_interval_hours")]
    pub interval_hours: f64,
    /// "HH:MM" in local time.
    #[serde(default = "default_daily_times")]
    pub daily_times: Vec<String>,
}

fn default_cadence_mode() -> CadenceMode { CadenceMode::Interval }
fn default_interval_hours() -> f64 { 8.0 }
fn default_daily_times() -> Vec<String> {
    vec!["08:00".into(), "18:00".into()]
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            mode: default_cadence_mode(),
            interval_hours: default_interval_hours(),
            daily_times: default_daily_times(),
        }
    }
}

impl CadenceConfig {
    /// Parse `daily_times`, sorted and deduplicated.
    pub fn parsed_daily_times(&self) -> Result<Vec<NaiveTime>> {
        if self.daily_times.is_empty() {
            return Err(RecipeBotError::Config(
                "cadence.daily_times is empty".into(),
            ));
        }
        let mut times = self
            .daily_times
            .iter()
            .map(|raw| parse_clock_time(raw))
            .collect::<Result<Vec<_>>>()?;
        times.sort();
        times.dedup();
        Ok(times)
    }
}

/// Parse "HH:MM" (or "HH:MM:SS").
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| RecipeBotError::Config(format!("invalid clock time '{raw}' (expected HH:MM)")))
}

/// What one dispatch cycle sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchShape {
    #[serde(alias = "text-only")]
    Text,
    #[serde(alias = "text+image")]
    Image,
    #[serde(alias = "text+poll")]
    Poll,
}

impl std::fmt::Display for DispatchShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchShape::Text => write!(f, "text"),
            DispatchShape::Image => write!(f, "text+image"),
            DispatchShape::Poll => write!(f, "text+poll"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_shape")]
    pub shape: DispatchShape,
    /// Delay after a transient failure before the next attempt.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    /// Upper bound for every external call (catalog load, send, image).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_shape() -> DispatchShape { DispatchShape::Text }
fn default_backoff_secs() -> u64 { 60 }
fn default_request_timeout() -> u64 { 30 }

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            shape: default_shape(),
            backoff_secs: default_backoff_secs(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Poll settings, used when `dispatch.shape = "poll"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Emit a poll after every N successful dispatches.
    #[serde(default = "default_poll_every")]
    pub every: u32,
    #[serde(default = "default_question")]
    pub question: String,
    /// Each option doubles as the category it biases towards.
    #[serde(default = "default_options")]
    pub options: Vec<String>,
}

fn default_poll_every() -> u32 { 5 }
fn default_question() -> String { "What should we cook next?".into() }
fn default_options() -> Vec<String> {
    ["Breakfast", "Soup", "Main course", "Dessert"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            every: default_poll_every(),
            question: default_question(),
            options: default_options(),
        }
    }
}

/// Image generation settings, used when `dispatch.shape = "image"`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_image_size")]
    pub size: String,
    #[serde(default)]
    pub api_key: String,
    /// `{title}` is replaced with the recipe title.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

fn default_image_endpoint() -> String { "https://api.openai.com/v1".into() }
fn default_image_model() -> String { "dall-e-3".into() }
fn default_image_size() -> String { "1024x1024".into() }
fn default_prompt_template() -> String {
    "Appetizing food photograph of {title}, natural light".into()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            model: default_image_model(),
            size: default_image_size(),
            api_key: String::new(),
            prompt_template: default_prompt_template(),
        }
    }
}

impl std::fmt::Debug for ImageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("size", &self.size)
            .field("api_key", &redact(&self.api_key))
            .field("prompt_template", &self.prompt_template)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}
