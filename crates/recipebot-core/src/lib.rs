//! # RecipeBot Core
//!
//! Shared vocabulary for every RecipeBot crate:
//! - [`types`] — `Item`, `Bias`, `DispatchOutcome`, poll handles
//! - [`traits`] — the collaborators the scheduler talks to
//!   (`CatalogSource`, `Channel`, `ImageGenerator`)
//! - [`error`] — one error taxonomy, classified transient vs fatal
//! - [`config`] — TOML + environment configuration, validated at startup

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RecipeBotConfig;
pub use error::{RecipeBotError, Result};
pub use traits::{CatalogSource, Channel, ImageGenerator};
pub use types::{Bias, DispatchOutcome, Ingredient, Item, PollHandle, PollResult};
