use crate::prompt::join_sets;

/// Per-session learner state. Lives as long as one `learn` run and is never
/// written anywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    saved_words: Vec<String>,
    current_words: Option<String>,
    last_exercise: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_words(&self) -> &[String] {
        &self.saved_words
    }

    pub fn current_words(&self) -> Option<&str> {
        self.current_words.as_deref()
    }

    pub fn last_exercise(&self) -> Option<&str> {
        self.last_exercise.as_deref()
    }

    pub fn append_saved(&mut self, word_set: String) {
        self.saved_words.push(word_set);
    }

    pub fn set_current(&mut self, word_set: Option<String>) {
        self.current_words = word_set;
    }

    pub fn set_exercise(&mut self, exercise: Option<String>) {
        self.last_exercise = exercise;
    }

    /// Moves the current set to the end of the saved list. Returns `false`
    /// and changes nothing when there is no current set.
    pub fn save_current(&mut self) -> bool {
        match self.current_words.take() {
            Some(words) => {
                self.append_saved(words);
                true
            }
            None => false,
        }
    }

    /// Every set the learner has seen this session: saved ones first, then
    /// the unsaved current one.
    pub fn previous_words_text(&self) -> String {
        let mut sets: Vec<&str> = self.saved_words.iter().map(String::as_str).collect();
        if let Some(current) = self.current_words() {
            sets.push(current);
        }
        join_sets(&sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let state = SessionState::new();
        assert!(state.saved_words().is_empty());
        assert!(state.current_words().is_none());
        assert!(state.last_exercise().is_none());
        assert_eq!(state.previous_words_text(), "");
    }

    #[test]
    fn save_moves_current_into_saved() {
        let mut state = SessionState::new();
        state.append_saved("first".into());
        state.set_current(Some("second".into()));

        assert!(state.save_current());
        assert_eq!(state.saved_words(), ["first", "second"]);
        assert!(state.current_words().is_none());
    }

    #[test]
    fn save_without_current_is_noop() {
        let mut state = SessionState::new();
        state.append_saved("first".into());
        let before = state.clone();

        assert!(!state.save_current());
        assert_eq!(state, before);
    }

    #[test]
    fn previous_words_includes_current_after_saved() {
        let mut state = SessionState::new();
        state.append_saved("one".into());
        state.append_saved("two".into());
        state.set_current(Some("three".into()));
        assert_eq!(state.previous_words_text(), "one\n\ntwo\n\nthree");
    }

    #[test]
    fn exercise_slot_is_overwritten() {
        let mut state = SessionState::new();
        state.set_exercise(Some("old".into()));
        state.set_exercise(Some("new".into()));
        assert_eq!(state.last_exercise(), Some("new"));
        state.set_exercise(None);
        assert!(state.last_exercise().is_none());
    }
}
