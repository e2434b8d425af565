use std::time::Duration;

use thiserror::Error;

use super::secrets::API_KEY_ENV;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error(
        "Gemini API key is missing. Set {} or run `vocab llm --set <KEY>`.",
        API_KEY_ENV
    )]
    Unconfigured,
    #[error("{0}")]
    Backend(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response from the model: {0}")]
    Shape(String),
    #[error("no response within {}s", .0.as_secs())]
    Timeout(Duration),
}
