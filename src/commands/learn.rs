use std::io;
use std::time::{Duration, Instant};

use crate::controller::{Controller, Notice, NoticeLevel};
use crate::llm::{GenerationError, Generator, LlmConfig, TextGenerator};
use crate::palette::Palette;
use crate::session::SessionState;
use crate::settings::Settings;
use crate::tui::{LineInput, Theme, render_markdown};
use crate::utils::{first_line, pluralize};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};
use tracing::info;

const FLASH_SECS: f64 = 2.5;
const PAGE: u16 = 10;

pub async fn run(settings: Settings, config: LlmConfig) -> Result<()> {
    let generator = Generator::from_config(&config);
    let mut view = LearnView::new(settings);
    if !generator.is_configured() {
        view.set_notice(Notice::error(GenerationError::Unconfigured.to_string()));
    }
    info!(strategy = %generator.strategy(), "starting learn session");

    let controller = Controller::new(generator);
    start_session(&controller, &mut view).await?;

    info!(
        saved_sets = view.session.saved_words().len(),
        "learn session ended"
    );
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pane {
    Words,
    Exercise,
    Saved,
}

impl Pane {
    fn index(self) -> usize {
        match self {
            Pane::Words => 0,
            Pane::Exercise => 1,
            Pane::Saved => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            Pane::Words => Pane::Exercise,
            Pane::Exercise => Pane::Saved,
            Pane::Saved => Pane::Words,
        }
    }

    fn previous(self) -> Self {
        match self {
            Pane::Words => Pane::Saved,
            Pane::Exercise => Pane::Words,
            Pane::Saved => Pane::Exercise,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Words,
    Exercise,
}

impl Pending {
    fn progress_message(self) -> &'static str {
        match self {
            Pending::Words => "Generating words...",
            Pending::Exercise => "Creating practice exercise...",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Nothing,
    Quit,
    Save,
}

struct LearnView {
    settings: Settings,
    session: SessionState,
    focus: Pane,
    scroll: [u16; 3],
    /// Inner area of each pane as of the last draw.
    viewports: [Rect; 3],
    selected_saved: usize,
    notice: Option<(Notice, Instant)>,
    pending: Option<Pending>,
    interests_input: Option<LineInput>,
}

impl LearnView {
    fn new(settings: Settings) -> Self {
        Self {
            settings,
            session: SessionState::new(),
            focus: Pane::Words,
            scroll: [0; 3],
            viewports: [Rect::default(); 3],
            selected_saved: 0,
            notice: None,
            pending: None,
            interests_input: None,
        }
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some((notice, Instant::now()));
    }

    fn visible_notice(&self) -> Option<&Notice> {
        self.visible_notice_at(Instant::now())
    }

    /// Successes flash briefly; warnings and errors stay until replaced.
    fn visible_notice_at(&self, now: Instant) -> Option<&Notice> {
        let (notice, shown_at) = self.notice.as_ref()?;
        let age = now.saturating_duration_since(*shown_at).as_secs_f64();
        if notice.level == NoticeLevel::Success && age >= FLASH_SECS {
            return None;
        }
        Some(notice)
    }

    fn finish(&mut self, pending: Pending, notice: Notice) {
        if notice.level == NoticeLevel::Success {
            let pane = match pending {
                Pending::Words => Pane::Words,
                Pending::Exercise => Pane::Exercise,
            };
            self.scroll[pane.index()] = 0;
        }
        self.set_notice(notice);
    }

    fn after_save(&mut self, notice: Notice) {
        self.selected_saved = self.session.saved_words().len().saturating_sub(1);
        self.scroll[Pane::Words.index()] = 0;
        self.scroll[Pane::Saved.index()] = 0;
        self.set_notice(notice);
    }

    fn selected_set(&self) -> Option<&str> {
        self.session
            .saved_words()
            .get(self.selected_saved)
            .map(String::as_str)
    }

    fn pane_text(&self, pane: Pane) -> Text<'static> {
        match pane {
            Pane::Words => match self.session.current_words() {
                Some(words) => render_markdown(words),
                None => placeholder("Press g to get new vocabulary."),
            },
            Pane::Exercise => match self.session.last_exercise() {
                Some(exercise) => render_markdown(exercise),
                None => placeholder("Save a word set, then press e for a practice worksheet."),
            },
            Pane::Saved => self.saved_pane_text(),
        }
    }

    fn set_viewports(&mut self, area: Rect) {
        let screen = ScreenLayout::new(area);
        for (pane, rect) in [
            (Pane::Words, screen.words),
            (Pane::Exercise, screen.exercise),
            (Pane::Saved, screen.saved),
        ] {
            self.viewports[pane.index()] = Theme::panel("", false).inner(rect);
        }
        for pane in [Pane::Words, Pane::Exercise, Pane::Saved] {
            let max = self.max_scroll(pane);
            let slot = &mut self.scroll[pane.index()];
            *slot = (*slot).min(max);
        }
    }

    /// Largest offset that still fills the pane, counted in wrapped rows.
    fn max_scroll(&self, pane: Pane) -> u16 {
        let viewport = self.viewports[pane.index()];
        let text = self.pane_text(pane);
        let rows = if viewport.width == 0 {
            text.lines.len()
        } else {
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .line_count(viewport.width)
        };
        let max = rows.saturating_sub(usize::from(viewport.height.max(1)));
        u16::try_from(max).unwrap_or(u16::MAX)
    }

    fn scroll_focused(&mut self, delta: i32) {
        let max = i32::from(self.max_scroll(self.focus));
        let slot = &mut self.scroll[self.focus.index()];
        let next = (i32::from(*slot) + delta).clamp(0, max);
        *slot = u16::try_from(next).unwrap_or(u16::MAX);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }
        if self.interests_input.is_some() {
            self.handle_input_key(key);
            return Action::Nothing;
        }
        if ctrl {
            return Action::Nothing;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Action::Quit,
            KeyCode::Char('g') => self.pending = Some(Pending::Words),
            KeyCode::Char('e') => self.pending = Some(Pending::Exercise),
            KeyCode::Char('s') if self.session.current_words().is_some() => return Action::Save,
            KeyCode::Char('l') => self.settings.cycle_level(),
            KeyCode::Char('t') => self.settings.cycle_tone(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.settings.more_words(),
            KeyCode::Char('-') => self.settings.fewer_words(),
            KeyCode::Char(']') => self.settings.warmer(),
            KeyCode::Char('[') => self.settings.cooler(),
            KeyCode::Char('i') => {
                self.interests_input = Some(LineInput::new(&self.settings.interests));
            }
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Up => self.scroll_focused(-1),
            KeyCode::Down => self.scroll_focused(1),
            KeyCode::PageUp => self.scroll_focused(-i32::from(PAGE)),
            KeyCode::PageDown => self.scroll_focused(i32::from(PAGE)),
            KeyCode::Left if self.focus == Pane::Saved => {
                self.selected_saved = self.selected_saved.saturating_sub(1);
                self.scroll[Pane::Saved.index()] = 0;
            }
            KeyCode::Right if self.focus == Pane::Saved => {
                let last = self.session.saved_words().len().saturating_sub(1);
                self.selected_saved = (self.selected_saved + 1).min(last);
                self.scroll[Pane::Saved.index()] = 0;
            }
            _ => {}
        }
        Action::Nothing
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        let Some(input) = self.interests_input.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                self.settings.interests = input.value().trim().to_string();
                self.interests_input = None;
            }
            KeyCode::Esc => self.interests_input = None,
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => input.clear(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.insert_char(c)
            }
            KeyCode::Backspace => input.backspace(),
            KeyCode::Delete => input.delete(),
            KeyCode::Left => input.move_left(),
            KeyCode::Right => input.move_right(),
            KeyCode::Home => input.move_home(),
            KeyCode::End => input.move_end(),
            _ => {}
        }
    }

    fn saved_pane_text(&self) -> Text<'static> {
        let saved = self.session.saved_words();
        if saved.is_empty() {
            return Text::from(Line::from(Span::styled(
                "No saved words yet.",
                Theme::muted(),
            )));
        }

        let mut lines: Vec<Line<'static>> = saved
            .iter()
            .enumerate()
            .map(|(idx, _)| {
                let label = format!("Word Set {}", idx + 1);
                if idx == self.selected_saved {
                    Line::from(vec![Theme::label_span(format!("▸ {label}"))])
                } else {
                    Line::from(vec![Theme::span(format!("  {label}"))])
                }
            })
            .collect();
        lines.push(Line::default());
        if let Some(selected) = self.selected_set() {
            lines.extend(render_markdown(selected).lines);
        }
        Text::from(lines)
    }
}

struct ScreenLayout {
    settings: Rect,
    words: Rect,
    exercise: Rect,
    saved: Rect,
    footer: Rect,
}

impl ScreenLayout {
    fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(5)])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(67), Constraint::Percentage(33)])
            .split(rows[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Percentage(55),
                Constraint::Min(4),
            ])
            .split(columns[0]);

        Self {
            settings: left[0],
            words: left[1],
            exercise: left[2],
            saved: columns[1],
            footer: rows[1],
        }
    }
}

async fn start_session<G: TextGenerator>(
    controller: &Controller<G>,
    view: &mut LearnView,
) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .context("failed to configure terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to start terminal")?;
    terminal.hide_cursor().context("failed to hide cursor")?;

    let loop_result: Result<()> = async {
        loop {
            terminal
                .draw(|frame| {
                    view.set_viewports(frame.area());
                    draw(frame, view);
                })
                .context("failed to render frame")?;

            // The progress message is on screen now; block on the call.
            if let Some(pending) = view.pending.take() {
                let notice = match pending {
                    Pending::Words => {
                        controller
                            .request_words(&mut view.session, &view.settings)
                            .await
                    }
                    Pending::Exercise => {
                        controller
                            .request_exercise(&mut view.session, &view.settings)
                            .await
                    }
                };
                view.finish(pending, notice);
                continue;
            }

            if event::poll(Duration::from_millis(16))?
                && let Event::Key(key) = event::read()?
            {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match view.handle_key(key) {
                    Action::Quit => break Ok(()),
                    Action::Save => {
                        if let Some(notice) = controller.save_current(&mut view.session) {
                            view.after_save(notice);
                        }
                    }
                    Action::Nothing => {}
                }
            }
        }
    }
    .await;

    teardown_terminal(&mut terminal)?;

    loop_result
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        PopKeyboardEnhancementFlags,
        LeaveAlternateScreen
    )
    .context("failed to restore terminal")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

fn draw(frame: &mut Frame<'_>, view: &LearnView) {
    let area = frame.area();
    frame.render_widget(Theme::backdrop(), area);
    let screen = ScreenLayout::new(area);

    draw_settings(frame, view, screen.settings);
    draw_pane(frame, view, Pane::Words, "Your New Words", screen.words);
    draw_pane(frame, view, Pane::Exercise, "Practice Exercise", screen.exercise);

    let saved_title = format!(
        "Saved Vocabulary Sets ({})",
        view.session.saved_words().len()
    );
    draw_pane(frame, view, Pane::Saved, &saved_title, screen.saved);

    let footer = Paragraph::new(instructions_text(view))
        .block(Theme::panel_with_line(Theme::section_header("Controls")))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, screen.footer);
}

fn draw_settings(frame: &mut Frame<'_>, view: &LearnView, area: Rect) {
    let line = match &view.interests_input {
        Some(input) => {
            let prefix = "Topics you like: ";
            let cursor_x = area.x + 1 + (prefix.chars().count() + input.cursor()) as u16;
            frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
            Line::from(vec![
                Theme::label_span(prefix),
                Theme::span(input.value()),
            ])
        }
        None => settings_line(&view.settings),
    };
    let widget = Paragraph::new(line).block(Theme::panel("Settings", false));
    frame.render_widget(widget, area);
}

fn draw_pane(
    frame: &mut Frame<'_>,
    view: &LearnView,
    pane: Pane,
    title: &str,
    area: Rect,
) {
    let widget = Paragraph::new(view.pane_text(pane))
        .block(Theme::panel(title, view.focus == pane))
        .wrap(Wrap { trim: false })
        .scroll((view.scroll[pane.index()], 0));
    frame.render_widget(widget, area);
}

fn placeholder(message: &str) -> Text<'static> {
    Text::from(Line::from(Span::styled(message.to_string(), Theme::muted())))
}

fn settings_line(settings: &Settings) -> Line<'static> {
    Line::from(vec![
        Theme::span("Level: "),
        Span::styled(
            settings.level.to_string(),
            Theme::bold(Palette::level(settings.level)),
        ),
        Theme::bullet(),
        Theme::span("Topics: "),
        Theme::label_span(settings.interests.clone()),
        Theme::bullet(),
        Theme::span("Words: "),
        Theme::label_span(settings.word_count().to_string()),
        Theme::bullet(),
        Theme::span("Style: "),
        Theme::label_span(settings.tone.to_string()),
        Theme::bullet(),
        Theme::span("Creativity: "),
        Theme::label_span(format!("{:.1}", settings.temperature())),
    ])
}

fn instructions_text(view: &LearnView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if view.interests_input.is_some() {
        lines.push(Line::from(vec![
            Theme::span("Editing topics"),
            Theme::bullet(),
            Theme::key_chip("Enter"),
            Theme::span(" confirm"),
            Theme::bullet(),
            Theme::key_chip("Esc"),
            Theme::span(" cancel"),
            Theme::bullet(),
            Theme::key_chip("Ctrl+U"),
            Theme::span(" clear"),
        ]));
    } else {
        let mut actions = vec![
            Theme::key_chip("G"),
            Theme::span(" new vocabulary"),
        ];
        if view.session.current_words().is_some() {
            actions.push(Theme::bullet());
            actions.push(Theme::key_chip("S"));
            actions.push(Theme::span(" save these words"));
        }
        actions.push(Theme::bullet());
        actions.push(Theme::key_chip("E"));
        actions.push(Theme::span(" practice exercise"));
        actions.push(Theme::bullet());
        actions.push(Theme::key_chip("Tab"));
        actions.push(Theme::span(" switch pane"));
        actions.push(Theme::bullet());
        actions.push(Theme::key_chip("Q"));
        actions.push(Theme::span(" quit"));
        lines.push(Line::from(actions));

        lines.push(Line::from(vec![
            Theme::key_chip("L"),
            Theme::span(" level"),
            Theme::bullet(),
            Theme::key_chip("I"),
            Theme::span(" topics"),
            Theme::bullet(),
            Theme::key_chip("+/-"),
            Theme::span(" words"),
            Theme::bullet(),
            Theme::key_chip("T"),
            Theme::span(" style"),
            Theme::bullet(),
            Theme::key_chip("[/]"),
            Theme::span(" creativity"),
            Theme::bullet(),
            Theme::span(pluralize("saved set", view.session.saved_words().len())),
        ]));
    }

    if let Some(pending) = view.pending {
        lines.push(Line::from(vec![Span::styled(
            pending.progress_message(),
            Theme::label(),
        )]));
    } else if let Some(notice) = view.visible_notice() {
        lines.push(Line::from(vec![Span::styled(
            first_line(&notice.message).to_string(),
            Theme::notice(notice.level),
        )]));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Level, Tone};
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn flatten_line(line: &Line<'_>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.to_string())
            .collect::<String>()
    }

    fn view() -> LearnView {
        LearnView::new(Settings::new(
            Level::Beginner,
            "music",
            5,
            Tone::FriendlyCoach,
            0.6,
        ))
    }

    #[test]
    fn action_keys_queue_generation() {
        let mut view = view();
        assert_eq!(view.handle_key(press(KeyCode::Char('g'))), Action::Nothing);
        assert_eq!(view.pending, Some(Pending::Words));

        view.pending = None;
        view.handle_key(press(KeyCode::Char('e')));
        assert_eq!(view.pending, Some(Pending::Exercise));
    }

    #[test]
    fn save_only_offered_with_current_words() {
        let mut view = view();
        assert_eq!(view.handle_key(press(KeyCode::Char('s'))), Action::Nothing);

        view.session.set_current(Some("### Word (noun)".into()));
        assert_eq!(view.handle_key(press(KeyCode::Char('s'))), Action::Save);
    }

    #[test]
    fn quit_keys() {
        let mut view = view();
        assert_eq!(view.handle_key(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(view.handle_key(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            view.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn settings_keys_adjust_settings() {
        let mut view = view();
        view.handle_key(press(KeyCode::Char('l')));
        view.handle_key(press(KeyCode::Char('t')));
        view.handle_key(press(KeyCode::Char('+')));
        view.handle_key(press(KeyCode::Char(']')));

        assert_eq!(view.settings.level, Level::Intermediate);
        assert_eq!(view.settings.tone, Tone::ExamFocusedTeacher);
        assert_eq!(view.settings.word_count(), 6);
        assert_eq!(view.settings.temperature(), 0.7);
    }

    #[test]
    fn editing_interests_commits_on_enter() {
        let mut view = view();
        view.handle_key(press(KeyCode::Char('i')));
        assert!(view.interests_input.is_some());

        // Keys go to the input, not to the actions.
        for c in ", jazz".chars() {
            view.handle_key(press(KeyCode::Char(c)));
        }
        assert!(view.pending.is_none());

        view.handle_key(press(KeyCode::Enter));
        assert!(view.interests_input.is_none());
        assert_eq!(view.settings.interests, "music, jazz");
    }

    #[test]
    fn editing_interests_cancels_on_escape() {
        let mut view = view();
        view.handle_key(press(KeyCode::Char('i')));
        view.handle_key(press(KeyCode::Backspace));
        assert_eq!(view.handle_key(press(KeyCode::Esc)), Action::Nothing);
        assert_eq!(view.settings.interests, "music");
    }

    #[test]
    fn saved_selection_stays_in_range() {
        let mut view = view();
        view.session.append_saved("one".into());
        view.session.append_saved("two".into());
        view.focus = Pane::Saved;

        view.handle_key(press(KeyCode::Right));
        view.handle_key(press(KeyCode::Right));
        assert_eq!(view.selected_saved, 1);
        assert_eq!(view.selected_set(), Some("two"));

        view.handle_key(press(KeyCode::Left));
        view.handle_key(press(KeyCode::Left));
        assert_eq!(view.selected_saved, 0);
    }

    #[test]
    fn tab_cycles_focus() {
        let mut view = view();
        view.handle_key(press(KeyCode::Tab));
        assert_eq!(view.focus, Pane::Exercise);
        view.handle_key(press(KeyCode::Tab));
        assert_eq!(view.focus, Pane::Saved);
        view.handle_key(press(KeyCode::BackTab));
        assert_eq!(view.focus, Pane::Exercise);
    }

    fn long_word_set(last_line: &str) -> String {
        let mut set = String::new();
        for word in ["Serene", "Vivid", "Candid", "Robust", "Humble"] {
            set.push_str(&format!(
                "### {word} (adjective)\n\
                 - Meaning: a fairly long explanation of {word} that will not fit on one row of the words pane\n\
                 - Example: Here is a sentence that uses {word} and is long enough to wrap as well.\n\n"
            ));
        }
        set.push_str(last_line);
        set
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn scrolling_is_bounded_by_content() {
        let mut view = view();
        view.handle_key(press(KeyCode::Down));
        assert_eq!(view.scroll[Pane::Words.index()], 0);

        view.session.set_current(Some("line one\n\nline two\n\nline three".into()));
        view.handle_key(press(KeyCode::PageDown));
        assert_eq!(view.scroll[Pane::Words.index()], view.max_scroll(Pane::Words));
        assert!(view.max_scroll(Pane::Words) > 0);

        view.handle_key(press(KeyCode::PageUp));
        assert_eq!(view.scroll[Pane::Words.index()], 0);
    }

    #[test]
    fn page_down_reaches_the_end_of_wrapped_words() {
        let mut view = view();
        view.session.set_current(Some(long_word_set("Last line of the set.")));
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| {
                view.set_viewports(frame.area());
                draw(frame, &view);
            })
            .unwrap();
        assert!(!screen_text(&terminal).contains("Last line of the set."));

        for _ in 0..50 {
            view.handle_key(press(KeyCode::PageDown));
        }

        terminal.draw(|frame| draw(frame, &view)).unwrap();
        assert!(screen_text(&terminal).contains("Last line of the set."));
    }

    #[test]
    fn growing_the_terminal_clamps_scroll() {
        let mut view = view();
        view.session.set_current(Some(long_word_set("end")));
        view.set_viewports(Rect::new(0, 0, 80, 24));
        for _ in 0..50 {
            view.handle_key(press(KeyCode::PageDown));
        }

        view.set_viewports(Rect::new(0, 0, 200, 60));
        assert_eq!(view.scroll[Pane::Words.index()], view.max_scroll(Pane::Words));
    }

    #[test]
    fn after_save_selects_newest_set() {
        let mut view = view();
        view.session.append_saved("one".into());
        view.session.set_current(Some("two".into()));
        view.session.save_current();

        view.after_save(Notice::success("Saved!"));
        assert_eq!(view.selected_set(), Some("two"));
    }

    #[test]
    fn instructions_hide_save_without_current_words() {
        let mut view = view();
        let first = flatten_line(&instructions_text(&view)[0]);
        assert!(!first.contains("save these words"));

        view.session.set_current(Some("### Word (noun)".into()));
        let first = flatten_line(&instructions_text(&view)[0]);
        assert!(first.contains("save these words"));
    }

    #[test]
    fn pending_message_replaces_notice() {
        let mut view = view();
        view.set_notice(Notice::error("Error while generating words: boom"));
        view.pending = Some(Pending::Words);

        let last = flatten_line(instructions_text(&view).last().unwrap());
        assert_eq!(last, "Generating words...");
    }

    #[test]
    fn errors_stay_visible_and_show_first_line() {
        let mut view = view();
        view.set_notice(Notice::error("request failed: HTTP 500\ndetails"));
        let later = Instant::now() + Duration::from_secs(60);
        assert!(view.visible_notice_at(later).is_some());

        let last = flatten_line(instructions_text(&view).last().unwrap());
        assert_eq!(last, "request failed: HTTP 500");
    }

    #[test]
    fn success_notices_fade() {
        let mut view = view();
        view.set_notice(Notice::success("Saved!"));
        assert!(view.visible_notice().is_some());

        let later = Instant::now() + Duration::from_secs(60);
        assert!(view.visible_notice_at(later).is_none());
    }

    #[test]
    fn settings_line_shows_every_setting() {
        let line = flatten_line(&settings_line(&view().settings));
        assert_eq!(
            line,
            "Level: Beginner • Topics: music • Words: 5 • Style: Friendly coach • Creativity: 0.6"
        );
    }

    #[test]
    fn saved_pane_lists_sets_and_expands_selection() {
        let mut view = view();
        let empty = view.saved_pane_text();
        assert_eq!(flatten_line(&empty.lines[0]), "No saved words yet.");

        view.session.append_saved("### Alpha (noun)".into());
        view.session.append_saved("### Beta (verb)".into());
        view.selected_saved = 1;
        let text = view.saved_pane_text();
        let rendered: Vec<String> = text.lines.iter().map(flatten_line).collect();
        assert_eq!(rendered[0], "  Word Set 1");
        assert_eq!(rendered[1], "▸ Word Set 2");
        assert!(rendered.contains(&"Beta (verb)".to_string()));
        assert!(!rendered.contains(&"Alpha (noun)".to_string()));
    }
}
