pub mod config;
pub mod download;
pub mod image_model;
pub mod prompt;

pub use config::{Config, Overrides, Settings};
pub use image_model::{Image, ImageSize, Model, OpenAIImages};
pub use prompt::Prompt;
