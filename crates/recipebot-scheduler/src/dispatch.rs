//! Dispatch pipeline — sends one rendered item through the channel and
//! classifies what happened.
//!
//! Every external call is bounded by the request timeout. Errors never
//! escape: they become a [`DispatchOutcome`] for the scheduler to act on.

use recipebot_catalog::{render, render_title};
use recipebot_core::config::DispatchShape;
use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::{Channel, ImageGenerator};
use recipebot_core::types::{DispatchOutcome, Item, PollHandle, PollResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Delivery-ready content for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub title: String,
    pub text: String,
}

impl Payload {
    pub fn from_item(item: &Item) -> Self {
        Self {
            title: render_title(item),
            text: render(item),
        }
    }
}

pub struct DispatchPipeline {
    channel: Arc<dyn Channel>,
    images: Option<Arc<dyn ImageGenerator>>,
    /// `{title}` is replaced with the item title.
    prompt_template: String,
    shape: DispatchShape,
    timeout: Duration,
}

impl DispatchPipeline {
    pub fn new(channel: Arc<dyn Channel>, shape: DispatchShape, timeout: Duration) -> Self {
        Self {
            channel,
            images: None,
            prompt_template: "{title}".into(),
            shape,
            timeout,
        }
    }

    pub fn with_image_generator(
        mut self,
        generator: Arc<dyn ImageGenerator>,
        prompt_template: impl Into<String>,
    ) -> Self {
        self.images = Some(generator);
        self.prompt_template = prompt_template.into();
        self
    }

    pub fn shape(&self) -> DispatchShape {
        self.shape
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Deliver one payload in the configured shape.
    pub async fn send(&self, payload: &Payload) -> DispatchOutcome {
        match self.shape {
            DispatchShape::Text | DispatchShape::Poll => self.send_text_only(payload).await,
            DispatchShape::Image => self.send_with_image(payload).await,
        }
    }

    async fn send_text_only(&self, payload: &Payload) -> DispatchOutcome {
        match self.bounded("send_text", self.channel.send_text(&payload.text)).await {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => outcome_for_error(&payload.title, e),
        }
    }

    async fn send_with_image(&self, payload: &Payload) -> DispatchOutcome {
        let Some(images) = &self.images else {
            return self
                .fall_back_to_text(payload, "no image generator configured")
                .await;
        };

        let prompt = self.prompt_template.replace("{title}", &payload.title);
        let image = match self.bounded("generate_image", images.generate(&prompt)).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(
                    "🎨 Image generation failed for '{}' ({}): {e}",
                    payload.title,
                    images.name()
                );
                return self
                    .fall_back_to_text(payload, &format!("image generation failed: {e}"))
                    .await;
            }
        };

        let fits = self
            .channel
            .caption_limit()
            .is_none_or(|limit| payload.text.chars().count() <= limit);
        let caption = if fits { &payload.text } else { &payload.title };

        match self
            .bounded("send_photo", self.channel.send_photo(&image, caption))
            .await
        {
            Ok(()) if fits => DispatchOutcome::Delivered,
            Ok(()) => {
                // Photo carried only the title; the recipe follows as text
                match self.bounded("send_text", self.channel.send_text(&payload.text)).await {
                    Ok(()) => DispatchOutcome::Delivered,
                    Err(e) => outcome_for_error(&payload.title, e),
                }
            }
            Err(e) if e.is_transient() => outcome_for_error(&payload.title, e),
            Err(e) => {
                tracing::warn!("🖼️ Photo rejected for '{}': {e}", payload.title);
                self.fall_back_to_text(payload, &format!("photo rejected: {e}"))
                    .await
            }
        }
    }

    /// Send text only; a success is reported as `Degraded(reason)`.
    async fn fall_back_to_text(&self, payload: &Payload, reason: &str) -> DispatchOutcome {
        match self.send_text_only(payload).await {
            DispatchOutcome::Delivered => DispatchOutcome::Degraded(reason.to_string()),
            other => other,
        }
    }

    /// Post a feedback poll.
    pub async fn send_poll(&self, question: &str, options: &[String]) -> Result<PollHandle> {
        self.bounded("send_poll", self.channel.send_poll(question, options))
            .await
    }

    /// Ask the channel how a poll turned out.
    pub async fn poll_result(&self, poll: &PollHandle) -> Result<PollResult> {
        self.bounded("get_poll_result", self.channel.get_poll_result(poll))
            .await
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| RecipeBotError::Timeout {
                operation: operation.to_string(),
                secs: self.timeout.as_secs(),
            })?
    }
}

/// Transient errors retry after backoff; anything else is logged and skipped.
fn outcome_for_error(title: &str, e: RecipeBotError) -> DispatchOutcome {
    if e.is_transient() {
        DispatchOutcome::TransientFailure(e.to_string())
    } else {
        tracing::warn!("⏭️ Skipping '{title}', channel rejected it: {e}");
        DispatchOutcome::Degraded(format!("skipped: {e}"))
    }
}
