//! Image transformation backends.

pub mod gemini_image_client;
pub mod prompts;

pub use gemini_image_client::GeminiImageClient;
