pub mod commands;
pub mod controller;
pub mod llm;
pub mod logging;
pub mod palette;
pub mod prompt;
pub mod session;
pub mod settings;
pub mod tui;
pub mod utils;
