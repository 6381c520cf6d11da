//! Collaborator traits — the seams between the dispatch core and the outside world.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Item, PollHandle, PollResult};

/// Where the full recipe collection comes from.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Human-readable description for logs (e.g. a file path).
    fn describe(&self) -> String;

    /// Load the whole collection.
    /// Fails with `CatalogUnavailable` or `CatalogMalformed`.
    async fn load(&self) -> Result<Vec<Item>>;
}

/// Outbound delivery channel.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Startup credential check. Channels without one succeed immediately.
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()>;

    /// Longest caption `send_photo` accepts, if the platform has a limit.
    fn caption_limit(&self) -> Option<usize> {
        None
    }

    /// Send an image (URL or platform file id) with a caption.
    async fn send_photo(&self, image_ref: &str, caption: &str) -> Result<()>;

    async fn send_poll(&self, question: &str, options: &[String]) -> Result<PollHandle>;

    /// Resolve a poll. The default reports `Pending` for channels that
    /// cannot read results back.
    async fn get_poll_result(&self, _poll: &PollHandle) -> Result<PollResult> {
        Ok(PollResult::Pending)
    }
}

/// Text-to-image service.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a reference the channel can send (usually a URL).
    async fn generate(&self, prompt: &str) -> Result<String>;
}
