//! Console channel — prints payloads to stdout instead of posting them.
//! Used for `--dry-run`.

use async_trait::async_trait;
use recipebot_core::error::Result;
use recipebot_core::traits::Channel;
use recipebot_core::types::PollHandle;
use std::sync::atomic::{AtomicI64, Ordering};

pub struct ConsoleChannel {
    next_message_id: AtomicI64,
}

impl ConsoleChannel {
    pub fn new() -> Self {
        Self {
            next_message_id: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> i64 {
        self.next_message_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ConsoleChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let id = self.next_id();
        println!("───── message #{id} ─────\n{text}\n");
        Ok(())
    }

    async fn send_photo(&self, image_ref: &str, caption: &str) -> Result<()> {
        let id = self.next_id();
        println!("───── photo #{id} ─────\n[image] {image_ref}\n{caption}\n");
        Ok(())
    }

    async fn send_poll(&self, question: &str, options: &[String]) -> Result<PollHandle> {
        let id = self.next_id();
        println!("───── poll #{id} ─────\n{question}");
        for (i, option) in options.iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }
        println!();
        Ok(PollHandle {
            message_id: id,
            poll_id: None,
            options: options.to_vec(),
        })
    }
}
