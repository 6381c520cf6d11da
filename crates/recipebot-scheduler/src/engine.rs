//! Scheduler engine — the main loop that draws, dispatches and waits.
//!
//! ```text
//!        ┌──────────── Waiting (cadence) ◄──── Delivered / Degraded
//!        ▼                                         ▲
//!  Idle ──► Dispatching ──────────────────────────┤
//!        ▲                                         ▼
//!        └──────────── Backoff (fixed delay) ◄─── TransientFailure
//! ```
//!
//! One dispatch cycle runs at a time and always completes before the next
//! wait starts. Shutdown is honoured only while waiting.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use recipebot_catalog::Catalog;
use recipebot_core::types::{Bias, DispatchOutcome};
use tokio::sync::watch;

use crate::cadence::Cadence;
use crate::dispatch::{DispatchPipeline, Payload};
use crate::feedback::FeedbackLoop;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Dispatching,
    Waiting,
    Backoff,
}

/// Counters for one scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub delivered: u64,
    pub degraded: u64,
    pub failed: u64,
    pub refills: u64,
    pub polls: u64,
}

impl RunStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        self.cycles += 1;
        match outcome {
            DispatchOutcome::Delivered => self.delivered += 1,
            DispatchOutcome::Degraded(_) => self.degraded += 1,
            DispatchOutcome::TransientFailure(_) => self.failed += 1,
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} delivered, {} degraded, {} failed, {} refills, {} polls",
            self.cycles, self.delivered, self.degraded, self.failed, self.refills, self.polls
        )
    }
}

pub struct Scheduler {
    catalog: Catalog,
    pipeline: DispatchPipeline,
    cadence: Cadence,
    feedback: Option<FeedbackLoop>,
    backoff: Duration,
    /// Daily slot most recently waited for.
    last_trigger: Option<DateTime<Local>>,
    state: SchedulerState,
    stats: RunStats,
}

impl Scheduler {
    pub fn new(
        catalog: Catalog,
        pipeline: DispatchPipeline,
        cadence: Cadence,
        backoff: Duration,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            cadence,
            feedback: None,
            backoff,
            last_trigger: None,
            state: SchedulerState::Idle,
            stats: RunStats::default(),
        }
    }

    pub fn with_feedback(mut self, feedback: FeedbackLoop) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one full cycle: resolve feedback, draw, render, deliver.
    /// Never fails; every error is folded into the outcome.
    pub async fn dispatch_cycle(&mut self) -> DispatchOutcome {
        self.state = SchedulerState::Dispatching;

        let bias = match self.feedback.as_mut() {
            Some(feedback) => {
                feedback.resolve(&self.pipeline).await;
                feedback.bias().clone()
            }
            None => Bias::none(),
        };

        let outcome = match self.catalog.pick(&bias).await {
            Ok(item) => {
                let payload = Payload::from_item(&item);
                let outcome = self.pipeline.send(&payload).await;
                match &outcome {
                    DispatchOutcome::Delivered => {
                        tracing::info!(
                            "📨 Delivered '{}' via {}",
                            payload.title,
                            self.pipeline.channel_name()
                        );
                    }
                    DispatchOutcome::Degraded(reason) => {
                        tracing::warn!("⚠️ Degraded delivery of '{}': {reason}", payload.title);
                    }
                    DispatchOutcome::TransientFailure(reason) => {
                        tracing::warn!("⚠️ Delivery of '{}' failed: {reason}", payload.title);
                    }
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not draw a recipe: {e}");
                DispatchOutcome::TransientFailure(format!("catalog: {e}"))
            }
        };

        if !outcome.is_transient_failure() {
            if let Some(feedback) = self.feedback.as_mut() {
                if feedback.after_dispatch(&self.pipeline).await {
                    self.stats.polls += 1;
                }
            }
        }

        self.stats.refills = self.catalog.refills();
        self.stats.record(&outcome);
        outcome
    }

    /// Pick the next state from an outcome and return how long to wait.
    pub fn next_delay(&mut self, outcome: &DispatchOutcome) -> Duration {
        if outcome.is_transient_failure() {
            self.state = SchedulerState::Backoff;
            self.backoff
        } else {
            self.state = SchedulerState::Waiting;
            self.cadence.delay_from(&Local::now(), &mut self.last_trigger)
        }
    }

    /// Loop until `shutdown` flips to `true`. The first dispatch happens
    /// immediately.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> RunStats {
        tracing::info!(
            "⏰ Scheduler started ({}, {} shape, backoff {}s, {} recipes)",
            self.cadence.describe(),
            self.pipeline.shape(),
            self.backoff.as_secs(),
            self.catalog.source_len()
        );

        while !*shutdown.borrow() {
            let outcome = self.dispatch_cycle().await;
            let delay = self.next_delay(&outcome);
            match self.state {
                SchedulerState::Backoff => {
                    tracing::info!("⏳ Backing off for {}s", delay.as_secs());
                }
                _ => tracing::debug!("💤 Next dispatch in {}s", delay.as_secs()),
            }
            if !wait_or_shutdown(delay, &mut shutdown).await {
                break;
            }
        }

        self.state = SchedulerState::Idle;
        tracing::info!("🛑 Scheduler stopped: {}", self.stats);
        self.stats
    }
}

/// Sleep for `delay`. Returns `false` if shutdown was requested first.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return false,
                Ok(()) => continue,
                // Sender gone: nobody can ask us to stop any more
                Err(_) => {
                    (&mut sleep).await;
                    return true;
                }
            },
        }
    }
}
