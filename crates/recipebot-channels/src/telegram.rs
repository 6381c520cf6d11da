//! Telegram Bot channel — posts to a chat or channel via the Bot API.
//!
//! The bot token is part of every request URL, so transport errors are
//! logged and returned without their URL.

use async_trait::async_trait;
use recipebot_core::config::ChannelConfig;
use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::Channel;
use recipebot_core::types::{PollHandle, PollResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest text Telegram accepts in one message.
pub const MESSAGE_LIMIT: usize = 4096;
/// Longest photo caption.
pub const CAPTION_LIMIT: usize = 1024;

/// Telegram channel configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Numeric id or `@channelusername`.
    pub chat_id: String,
    pub api_base: String,
    /// Per-request bound, so a stuck call cannot wedge the scheduler.
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn from_channel_config(config: &ChannelConfig, timeout_secs: u64) -> Self {
        Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Telegram Bot API channel bound to a single destination chat.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecipeBotError::Config(format!("HTTP client: {}", e.without_url())))?;
        Ok(Self { config, client })
    }

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base, self.config.bot_token, method
        )
    }

    /// POST one Bot API method and unwrap the `{ok, result}` envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(method, e))?;

        let status = response.status();
        let envelope: TelegramApiResponse<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) => {
                let detail = format!("{method}: unreadable response: {}", e.without_url());
                return Err(if status.is_success() {
                    RecipeBotError::Delivery(detail)
                } else {
                    classify(status.as_u16(), &detail)
                });
            }
        };

        if !envelope.ok {
            let code = envelope.error_code.unwrap_or(status.as_u16());
            let description = envelope.description.unwrap_or_default();
            return Err(classify(code, &format!("{method}: {description}")));
        }

        envelope
            .result
            .ok_or_else(|| RecipeBotError::Delivery(format!("{method}: response has no result")))
    }

    fn transport_error(&self, method: &str, e: reqwest::Error) -> RecipeBotError {
        if e.is_timeout() {
            RecipeBotError::Timeout {
                operation: method.to_string(),
                secs: self.config.timeout_secs,
            }
        } else {
            RecipeBotError::Delivery(format!("{method} failed: {}", e.without_url()))
        }
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        self.call("getMe", serde_json::json!({})).await
    }

    /// Send a text message, split into several when it exceeds the limit.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        for chunk in split_message(text, MESSAGE_LIMIT) {
            let _: TelegramMessage = self
                .call(
                    "sendMessage",
                    serde_json::json!({
                        "chat_id": self.config.chat_id,
                        "text": chunk,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    /// Send a photo by URL or file id.
    pub async fn send_photo_message(&self, photo: &str, caption: &str) -> Result<TelegramMessage> {
        self.call(
            "sendPhoto",
            serde_json::json!({
                "chat_id": self.config.chat_id,
                "photo": photo,
                "caption": caption,
            }),
        )
        .await
    }

    /// Post an anonymous regular poll.
    pub async fn send_poll_message(
        &self,
        question: &str,
        options: &[String],
    ) -> Result<TelegramMessage> {
        let options: Vec<_> = options
            .iter()
            .map(|o| serde_json::json!({ "text": o }))
            .collect();
        self.call(
            "sendPoll",
            serde_json::json!({
                "chat_id": self.config.chat_id,
                "question": question,
                "options": options,
                "is_anonymous": true,
            }),
        )
        .await
    }

    /// Close a poll and return its final tally.
    pub async fn stop_poll(&self, message_id: i64) -> Result<TelegramPoll> {
        self.call(
            "stopPoll",
            serde_json::json!({
                "chat_id": self.config.chat_id,
                "message_id": message_id,
            }),
        )
        .await
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn connect(&self) -> Result<()> {
        let me = self.get_me().await?;
        tracing::info!(
            "Telegram bot: @{} ({}) → chat {}",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name,
            self.config.chat_id
        );
        Ok(())
    }

    fn caption_limit(&self) -> Option<usize> {
        Some(CAPTION_LIMIT)
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.send_message(text).await
    }

    async fn send_photo(&self, image_ref: &str, caption: &str) -> Result<()> {
        if caption.chars().count() > CAPTION_LIMIT {
            return Err(RecipeBotError::Rejected(format!(
                "caption exceeds {CAPTION_LIMIT} characters"
            )));
        }
        self.send_photo_message(image_ref, caption).await?;
        Ok(())
    }

    async fn send_poll(&self, question: &str, options: &[String]) -> Result<PollHandle> {
        let message = self.send_poll_message(question, options).await?;
        Ok(PollHandle {
            message_id: message.message_id,
            poll_id: message.poll.map(|p| p.id),
            options: options.to_vec(),
        })
    }

    async fn get_poll_result(&self, poll: &PollHandle) -> Result<PollResult> {
        let tally = self.stop_poll(poll.message_id).await?;
        Ok(match tally.winner() {
            Some(option) => PollResult::Selected(option.to_string()),
            None => PollResult::NoVotes,
        })
    }
}

/// Map a Bot API error code to transient vs permanent.
fn classify(code: u16, detail: &str) -> RecipeBotError {
    if code == 429 || code >= 500 {
        RecipeBotError::Delivery(format!("{detail} (HTTP {code})"))
    } else {
        RecipeBotError::Rejected(format!("{detail} (HTTP {code})"))
    }
}

/// Split text into chunks of at most `limit` characters, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + needed > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    #[serde(default)]
    pub poll: Option<TelegramPoll>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramPoll {
    pub id: String,
    pub question: String,
    pub options: Vec<TelegramPollOption>,
    #[serde(default)]
    pub total_voter_count: u32,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramPollOption {
    pub text: String,
    pub voter_count: u32,
}

impl TelegramPoll {
    /// Option with the most votes; ties go to the earliest option.
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<&TelegramPollOption> = None;
        for option in &self.options {
            if option.voter_count > best.map_or(0, |b| b.voter_count) {
                best = Some(option);
            }
        }
        best.map(|o| o.text.as_str())
    }
}
