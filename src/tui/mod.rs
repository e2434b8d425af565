pub mod input;
pub mod markdown;
pub mod theme;

pub use input::LineInput;
pub use markdown::render_markdown;
pub use theme::Theme;
