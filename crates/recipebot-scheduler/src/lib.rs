//! # RecipeBot Scheduler
//!
//! Drives the delivery cadence: one dispatch cycle at a time, a fixed
//! backoff after transient failures, and an optional poll-driven bias.
//!
//! ## Architecture
//! ```text
//! Scheduler (tokio timers)
//!   ├── Cadence: every 8h | daily at 08:00, 18:00
//!   ├── Catalog.pick(bias) → Payload
//!   ├── DispatchPipeline → Channel (+ ImageGenerator)
//!   │     └── DispatchOutcome: Delivered | Degraded | TransientFailure
//!   └── FeedbackLoop (poll shape): every K dispatches → poll → bias
//! ```

pub mod cadence;
pub mod dispatch;
pub mod engine;
pub mod feedback;

#[cfg(test)]
pub(crate) mod test_support;

pub use cadence::{Cadence, next_daily_trigger};
pub use dispatch::{DispatchPipeline, Payload};
pub use engine::{RunStats, Scheduler, SchedulerState};
pub use feedback::FeedbackLoop;
