//! Data model — what gets drawn, delivered, and reported.

use serde::{Deserialize, Serialize};

/// Title used when a catalog record has none.
pub const UNTITLED: &str = "Untitled";

/// One ingredient line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    /// Free-form quantity ("200 g", "a pinch"). Empty when the catalog
    /// supplied ingredients as pre-joined text.
    pub amount: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }
}

/// A deliverable recipe. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub category: Option<String>,
}

impl Item {
    /// Create an item with just a title; handy for tests and fixtures.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case-insensitive category comparison.
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(category.trim()))
    }
}

/// Category preference fed back from polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bias {
    pub selected_category: Option<String>,
}

impl Bias {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            selected_category: Some(category.into()),
        }
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }
}

/// Result of one dispatch attempt. Consumed immediately by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Payload delivered in the configured shape.
    Delivered,
    /// Worth another attempt after the backoff delay.
    TransientFailure(String),
    /// Something was delivered (or deliberately skipped), but not as configured.
    Degraded(String),
}

impl DispatchOutcome {
    pub fn is_transient_failure(&self) -> bool {
        matches!(self, DispatchOutcome::TransientFailure(_))
    }
}

impl std::fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchOutcome::Delivered => write!(f, "delivered"),
            DispatchOutcome::TransientFailure(reason) => write!(f, "transient failure: {reason}"),
            DispatchOutcome::Degraded(reason) => write!(f, "degraded: {reason}"),
        }
    }
}

/// Reference to a poll posted on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollHandle {
    /// Message carrying the poll.
    pub message_id: i64,
    /// Platform poll identifier, when the platform has one.
    pub poll_id: Option<String>,
    /// Options in the order they were offered.
    pub options: Vec<String>,
}

/// Answer from [`crate::traits::Channel::get_poll_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    Selected(String),
    NoVotes,
    Pending,
}
