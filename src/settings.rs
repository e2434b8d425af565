use std::fmt;

use clap::ValueEnum;

use crate::prompt::build_word_prompt;

pub const MIN_WORDS: u8 = 3;
pub const MAX_WORDS: u8 = 10;
pub const DEFAULT_WORDS: u8 = 5;
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_INTERESTS: &str = "technology, science";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Level::Beginner => Level::Intermediate,
            Level::Intermediate => Level::Advanced,
            Level::Advanced => Level::Beginner,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Tone {
    #[default]
    FriendlyCoach,
    ExamFocusedTeacher,
    ProfessionalTrainer,
}

impl Tone {
    pub const ALL: [Tone; 3] = [
        Tone::FriendlyCoach,
        Tone::ExamFocusedTeacher,
        Tone::ProfessionalTrainer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::FriendlyCoach => "Friendly coach",
            Tone::ExamFocusedTeacher => "Exam-focused teacher",
            Tone::ProfessionalTrainer => "Professional trainer",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tone::FriendlyCoach => Tone::ExamFocusedTeacher,
            Tone::ExamFocusedTeacher => Tone::ProfessionalTrainer,
            Tone::ProfessionalTrainer => Tone::FriendlyCoach,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Learner preferences for the next generation call.
///
/// Word count and temperature are clamped on every write, so a `Settings`
/// value is always inside the ranges the prompts are written for.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub level: Level,
    pub interests: String,
    pub tone: Tone,
    word_count: u8,
    temperature: f32,
}

impl Settings {
    pub fn new(
        level: Level,
        interests: impl Into<String>,
        word_count: u8,
        tone: Tone,
        temperature: f32,
    ) -> Self {
        let mut settings = Self {
            level,
            interests: interests.into(),
            tone,
            word_count: DEFAULT_WORDS,
            temperature: DEFAULT_TEMPERATURE,
        };
        settings.set_word_count(word_count);
        settings.set_temperature(temperature);
        settings
    }

    pub fn word_count(&self) -> u8 {
        self.word_count
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn set_word_count(&mut self, count: u8) {
        self.word_count = count.clamp(MIN_WORDS, MAX_WORDS);
    }

    pub fn set_temperature(&mut self, temperature: f32) {
        let temperature = if temperature.is_nan() {
            DEFAULT_TEMPERATURE
        } else {
            temperature
        };
        // Tenths only, so repeated +/- never drifts.
        self.temperature = ((temperature.clamp(0.0, 1.0) * 10.0).round()) / 10.0;
    }

    pub fn more_words(&mut self) {
        self.set_word_count(self.word_count.saturating_add(1));
    }

    pub fn fewer_words(&mut self) {
        self.set_word_count(self.word_count.saturating_sub(1));
    }

    pub fn warmer(&mut self) {
        self.set_temperature(self.temperature + 0.1);
    }

    pub fn cooler(&mut self) {
        self.set_temperature(self.temperature - 0.1);
    }

    pub fn cycle_level(&mut self) {
        self.level = self.level.next();
    }

    pub fn cycle_tone(&mut self) {
        self.tone = self.tone.next();
    }

    pub fn word_prompt(&self, previous_words: &str) -> String {
        build_word_prompt(
            self.level.as_str(),
            &self.interests,
            self.tone.as_str(),
            self.word_count,
            previous_words,
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(
            Level::default(),
            DEFAULT_INTERESTS,
            DEFAULT_WORDS,
            Tone::default(),
            DEFAULT_TEMPERATURE,
        )
    }
}

/// clap value parser for `--temperature`.
pub fn parse_temperature(raw: &str) -> Result<f32, String> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("temperature must be between 0.0 and 1.0, got {value}"));
    }
    let tenths = value * 10.0;
    if (tenths - tenths.round()).abs() > 1e-3 {
        return Err(format!("temperature moves in steps of 0.1, got {value}"));
    }
    Ok(tenths.round() / 10.0)
}
