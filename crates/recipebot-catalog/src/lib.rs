//! # RecipeBot Catalog
//!
//! Owns the pool of undelivered recipes and the rule for drawing from it.
//!
//! ```text
//! CatalogSource::load() ──► source (full copy)
//!                              │ refill when active is empty
//!                              ▼
//!   Bias ──► Selector ──► active pool ──draw (remove)──► Item ──► render()
//! ```
//!
//! An item drawn from the active pool cannot come back until the pool is
//! exhausted and refilled from a fresh load.

pub mod catalog;
pub mod render;
pub mod selector;
pub mod source;

pub use catalog::Catalog;
pub use render::{render, render_title};
pub use selector::Selector;
pub use source::JsonFileSource;
