use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{GenerationError, TextGenerator};
use crate::prompt::build_exercise_prompt;
use crate::session::SessionState;
use crate::settings::Settings;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Save at least one vocabulary set first.")]
    NothingSaved,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// Inline message shown after a user action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    fn from_failure(context: &str, err: &ActionError) -> Self {
        match err {
            ActionError::NothingSaved => Self::warning(err.to_string()),
            ActionError::Generation(inner) => Self::error(format!("{context}: {inner}")),
        }
    }
}

/// Wires the three session actions to prompt building and generation.
/// Failures end up as a [`Notice`]; the session is left as it was.
pub struct Controller<G> {
    generator: G,
}

impl<G: TextGenerator> Controller<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn request_words(&self, session: &mut SessionState, settings: &Settings) -> Notice {
        match self.try_request_words(session, settings).await {
            Ok(()) => Notice::success("Words generated!"),
            Err(err) => Notice::from_failure("Error while generating words", &err),
        }
    }

    pub fn save_current(&self, session: &mut SessionState) -> Option<Notice> {
        if !session.save_current() {
            return None;
        }
        info!(saved_sets = session.saved_words().len(), "saved word set");
        Some(Notice::success("Saved!"))
    }

    pub async fn request_exercise(&self, session: &mut SessionState, settings: &Settings) -> Notice {
        match self.try_request_exercise(session, settings).await {
            Ok(()) => Notice::success("Exercise ready!"),
            Err(err) => Notice::from_failure("Error while generating exercise", &err),
        }
    }

    async fn try_request_words(
        &self,
        session: &mut SessionState,
        settings: &Settings,
    ) -> Result<(), ActionError> {
        let prompt = settings.word_prompt(&session.previous_words_text());
        let words = self
            .generator
            .generate(&prompt, settings.temperature())
            .await
            .inspect_err(|err| warn!(error = %err, "word generation failed"))?;
        session.set_current(Some(words));
        Ok(())
    }

    async fn try_request_exercise(
        &self,
        session: &mut SessionState,
        settings: &Settings,
    ) -> Result<(), ActionError> {
        if session.saved_words().is_empty() {
            return Err(ActionError::NothingSaved);
        }
        let prompt = build_exercise_prompt(session.saved_words());
        let exercise = self
            .generator
            .generate(&prompt, settings.temperature())
            .await
            .inspect_err(|err| warn!(error = %err, "exercise generation failed"))?;
        session.set_exercise(Some(exercise));
        Ok(())
    }
}
