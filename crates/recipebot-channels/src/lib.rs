//! # RecipeBot Channels
//! Outbound delivery channels.

pub mod console;
pub mod telegram;

pub use console::ConsoleChannel;
pub use telegram::{TelegramChannel, TelegramConfig};
