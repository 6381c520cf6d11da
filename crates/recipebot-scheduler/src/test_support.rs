//! In-memory collaborators for scheduler tests.

use async_trait::async_trait;
use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::{CatalogSource, Channel, ImageGenerator};
use recipebot_core::types::{Item, PollHandle, PollResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// What a [`FakeChannel`] was asked to send, stamped with the (possibly
/// paused) tokio clock.
#[derive(Debug, Clone)]
pub enum Sent {
    Text { at: Instant, text: String },
    Photo { at: Instant, image: String, caption: String },
    Poll { at: Instant, question: String },
}

impl Sent {
    pub fn at(&self) -> Instant {
        match self {
            Sent::Text { at, .. } | Sent::Photo { at, .. } | Sent::Poll { at, .. } => *at,
        }
    }
}

pub struct FakeChannel {
    sent: Mutex<Vec<Sent>>,
    text_failures: Mutex<VecDeque<RecipeBotError>>,
    photo_failures: Mutex<VecDeque<RecipeBotError>>,
    poll_failures: Mutex<VecDeque<RecipeBotError>>,
    poll_result: Mutex<PollResult>,
    caption_limit: Option<usize>,
    stuck: bool,
    next_message_id: AtomicI64,
}

impl FakeChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            text_failures: Mutex::new(VecDeque::new()),
            photo_failures: Mutex::new(VecDeque::new()),
            poll_failures: Mutex::new(VecDeque::new()),
            poll_result: Mutex::new(PollResult::Pending),
            caption_limit: None,
            stuck: false,
            next_message_id: AtomicI64::new(1),
        }
    }

    pub fn with_caption_limit(mut self, limit: usize) -> Self {
        self.caption_limit = Some(limit);
        self
    }

    pub fn with_poll_result(self, result: PollResult) -> Self {
        self.set_poll_result(result);
        self
    }

    /// Every send hangs forever.
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    pub fn set_poll_result(&self, result: PollResult) {
        *self.poll_result.lock().unwrap() = result;
    }

    pub fn fail_next_text(&self, err: RecipeBotError) {
        self.text_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_photo(&self, err: RecipeBotError) {
        self.photo_failures.lock().unwrap().push_back(err);
    }

    pub fn fail_next_poll(&self, err: RecipeBotError) {
        self.poll_failures.lock().unwrap().push_back(err);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    async fn hang_if_stuck(&self) {
        if self.stuck {
            std::future::pending::<()>().await;
        }
    }

    fn record(&self, sent: Sent) {
        self.sent.lock().unwrap().push(sent);
    }
}

#[async_trait]
impl Channel for FakeChannel {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.hang_if_stuck().await;
        if let Some(err) = self.text_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.record(Sent::Text {
            at: Instant::now(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn caption_limit(&self) -> Option<usize> {
        self.caption_limit
    }

    async fn send_photo(&self, image_ref: &str, caption: &str) -> Result<()> {
        self.hang_if_stuck().await;
        if let Some(err) = self.photo_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.record(Sent::Photo {
            at: Instant::now(),
            image: image_ref.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_poll(&self, question: &str, options: &[String]) -> Result<PollHandle> {
        self.hang_if_stuck().await;
        if let Some(err) = self.poll_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.record(Sent::Poll {
            at: Instant::now(),
            question: question.to_string(),
        });
        Ok(PollHandle {
            message_id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
            poll_id: None,
            options: options.to_vec(),
        })
    }

    async fn get_poll_result(&self, _poll: &PollHandle) -> Result<PollResult> {
        Ok(self.poll_result.lock().unwrap().clone())
    }
}

pub struct FixedImages(pub String);

#[async_trait]
impl ImageGenerator for FixedImages {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct FailingImages;

#[async_trait]
impl ImageGenerator for FailingImages {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(RecipeBotError::Generation("quota exceeded".into()))
    }
}

/// Catalog source backed by a fixed list; flip `broken` to fail loads.
pub struct MemorySource {
    items: Vec<Item>,
    pub broken: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            broken: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl CatalogSource for MemorySource {
    fn describe(&self) -> String {
        "memory".into()
    }

    async fn load(&self) -> Result<Vec<Item>> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(RecipeBotError::CatalogUnavailable("memory source offline".into()));
        }
        Ok(self.items.clone())
    }
}
