//! Feedback loop — periodic polls whose winning option biases later draws.
//!
//! ```text
//! dispatch #K ──► send_poll ──► (open poll)
//! next cycle  ──► get_poll_result
//!                   ├── Selected(opt) → bias = opt
//!                   ├── NoVotes       → bias cleared
//!                   └── Pending       → keep waiting
//! ```

use recipebot_core::config::FeedbackConfig;
use recipebot_core::types::{Bias, PollHandle, PollResult};

use crate::dispatch::DispatchPipeline;

pub struct FeedbackLoop {
    every: u32,
    question: String,
    options: Vec<String>,
    bias: Bias,
    open_poll: Option<PollHandle>,
    since_last_poll: u32,
}

impl FeedbackLoop {
    pub fn new(every: u32, question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            every: every.max(1),
            question: question.into(),
            options,
            bias: Bias::none(),
            open_poll: None,
            since_last_poll: 0,
        }
    }

    pub fn from_config(config: &FeedbackConfig) -> Self {
        Self::new(config.every, config.question.clone(), config.options.clone())
    }

    /// Current bias. Only this loop writes it.
    pub fn bias(&self) -> &Bias {
        &self.bias
    }

    pub fn open_poll(&self) -> Option<&PollHandle> {
        self.open_poll.as_ref()
    }

    /// Fold the open poll's result (if any) into the bias.
    pub async fn resolve(&mut self, pipeline: &DispatchPipeline) {
        let Some(poll) = self.open_poll.take() else {
            return;
        };

        match pipeline.poll_result(&poll).await {
            Ok(PollResult::Selected(option)) => {
                tracing::info!("🗳️ Poll closed, next recipes lean towards '{option}'");
                self.bias = Bias::category(option);
            }
            Ok(PollResult::NoVotes) => {
                tracing::info!("🗳️ Poll closed without votes, bias cleared");
                self.bias = Bias::none();
            }
            Ok(PollResult::Pending) => {
                tracing::debug!("🗳️ Poll {} still open", poll.message_id);
                self.open_poll = Some(poll);
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Could not read poll {} result, dropping it: {e}",
                    poll.message_id
                );
            }
        }
    }

    /// Count one successful dispatch and post a poll when one is due.
    /// Returns whether a poll went out.
    pub async fn after_dispatch(&mut self, pipeline: &DispatchPipeline) -> bool {
        self.since_last_poll += 1;
        if self.since_last_poll < self.every {
            return false;
        }
        self.since_last_poll = 0;

        if let Some(stale) = self.open_poll.take() {
            tracing::info!("🗳️ Abandoning unresolved poll {}", stale.message_id);
        }

        match pipeline.send_poll(&self.question, &self.options).await {
            Ok(handle) => {
                tracing::info!("🗳️ Poll posted (message {})", handle.message_id);
                self.open_poll = Some(handle);
                true
            }
            Err(e) => {
                tracing::warn!("⚠️ Poll could not be posted: {e}");
                false
            }
        }
    }
}
