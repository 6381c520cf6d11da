//! # RecipeBot Providers
//!
//! Image generation for the `text+image` dispatch shape. Any endpoint that
//! speaks the OpenAI `images/generations` API works; providers differ only
//! by endpoint URL, model name, and API key.

pub mod openai_images;

use recipebot_core::config::ImageConfig;
use recipebot_core::error::Result;
use recipebot_core::traits::ImageGenerator;

pub use openai_images::OpenAiImageGenerator;

/// Create the image generator described by configuration.
pub fn create_image_generator(
    config: &ImageConfig,
    timeout_secs: u64,
) -> Result<Box<dyn ImageGenerator>> {
    Ok(Box::new(OpenAiImageGenerator::from_config(config, timeout_secs)?))
}
