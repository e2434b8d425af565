pub mod client;
pub mod error;
#[cfg(feature = "sdk")]
pub mod managed;
pub mod rest;
pub mod secrets;

pub use client::{
    Generator, LlmConfig, Strategy, TextGenerator, test_configured_api_key,
};
pub use error::GenerationError;
pub use secrets::{ApiKey, clear_api_key, prompt_for_api_key, store_api_key};
