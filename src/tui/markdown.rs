use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::palette::Palette;

const CELL_SEPARATOR: &str = " │ ";

/// Renders generated word sets and worksheets for the session panes.
pub fn render_markdown(md: &str) -> Text<'static> {
    let parser = Parser::new_ext(md, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut lines: Vec<Line> = Vec::new();
    let mut current_line: Vec<Span> = Vec::new();
    let mut styles = vec![Style::default()];
    let mut list_stack: Vec<ListKind> = Vec::new();
    let mut pending_prefix: Option<String> = None;
    let mut in_code_block = false;
    let mut cell_index = 0usize;

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    flush_line(&mut lines, &mut current_line);
                    push_style(&mut styles, |_| heading_style(level));
                }
                Tag::Strong => push_style(&mut styles, |style| style.add_modifier(Modifier::BOLD)),
                Tag::Emphasis => {
                    push_style(&mut styles, |style| style.add_modifier(Modifier::ITALIC))
                }
                Tag::Strikethrough => push_style(&mut styles, |style| {
                    style.add_modifier(Modifier::CROSSED_OUT)
                }),
                Tag::BlockQuote(_) => {
                    push_style(&mut styles, |style| style.add_modifier(Modifier::DIM))
                }
                Tag::CodeBlock(_) => {
                    flush_line(&mut lines, &mut current_line);
                    in_code_block = true;
                    push_style(&mut styles, |_| {
                        Style::default().add_modifier(Modifier::DIM)
                    });
                }
                Tag::List(start) => list_stack.push(ListKind::from(start)),
                Tag::Item => {
                    flush_line(&mut lines, &mut current_line);
                    pending_prefix = Some(list_prefix(list_stack.as_mut_slice()));
                }
                Tag::TableHead => {
                    flush_line(&mut lines, &mut current_line);
                    cell_index = 0;
                    push_style(&mut styles, |style| style.add_modifier(Modifier::BOLD));
                }
                Tag::TableRow => {
                    flush_line(&mut lines, &mut current_line);
                    cell_index = 0;
                }
                Tag::TableCell => {
                    if cell_index > 0 {
                        current_line.push(Span::styled(
                            CELL_SEPARATOR,
                            Style::default().add_modifier(Modifier::DIM),
                        ));
                    }
                    cell_index += 1;
                }
                _ => {}
            },
            Event::End(tag) => match tag {
                TagEnd::Paragraph => {
                    flush_line(&mut lines, &mut current_line);
                    if list_stack.is_empty() {
                        lines.push(Line::default());
                    }
                }
                TagEnd::Heading(_) => {
                    flush_line(&mut lines, &mut current_line);
                    lines.push(Line::default());
                    pop_style(&mut styles);
                }
                TagEnd::CodeBlock => {
                    flush_line(&mut lines, &mut current_line);
                    lines.push(Line::default());
                    in_code_block = false;
                    pop_style(&mut styles);
                }
                TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough | TagEnd::BlockQuote(_) => {
                    pop_style(&mut styles);
                }
                TagEnd::List(_) => {
                    flush_line(&mut lines, &mut current_line);
                    list_stack.pop();
                    if list_stack.is_empty() {
                        lines.push(Line::default());
                    }
                }
                TagEnd::Item => {
                    flush_line(&mut lines, &mut current_line);
                    pending_prefix = None;
                }
                TagEnd::TableHead => {
                    flush_line(&mut lines, &mut current_line);
                    pop_style(&mut styles);
                }
                TagEnd::TableRow => flush_line(&mut lines, &mut current_line),
                TagEnd::Table => {
                    flush_line(&mut lines, &mut current_line);
                    lines.push(Line::default());
                }
                _ => {}
            },
            Event::Text(text) => push_text(
                text.as_ref(),
                current_style(&styles),
                in_code_block,
                &mut lines,
                &mut current_line,
                &mut pending_prefix,
            ),
            Event::Code(code) => {
                maybe_apply_prefix(&mut current_line, &mut pending_prefix);
                current_line.push(Span::styled(
                    code.to_string(),
                    Style::default().add_modifier(Modifier::REVERSED),
                ));
            }
            Event::Html(html) | Event::InlineHtml(html) => push_text(
                html.as_ref(),
                current_style(&styles),
                in_code_block,
                &mut lines,
                &mut current_line,
                &mut pending_prefix,
            ),
            Event::SoftBreak => {
                if in_code_block {
                    flush_line(&mut lines, &mut current_line);
                } else {
                    maybe_apply_prefix(&mut current_line, &mut pending_prefix);
                    current_line.push(Span::raw(" "));
                }
            }
            Event::HardBreak => flush_line(&mut lines, &mut current_line),
            Event::Rule => {
                flush_line(&mut lines, &mut current_line);
                lines.push(Line::from(Span::styled(
                    "─".repeat(20),
                    Style::default().add_modifier(Modifier::DIM),
                )));
                lines.push(Line::default());
            }
            Event::TaskListMarker(done) => {
                maybe_apply_prefix(&mut current_line, &mut pending_prefix);
                current_line.push(Span::styled(
                    format!("[{}] ", if done { 'x' } else { ' ' }),
                    current_style(&styles),
                ));
            }
            _ => {}
        }
    }

    flush_line(&mut lines, &mut current_line);
    Text::from(lines)
}

fn push_text(
    text: &str,
    style: Style,
    in_code_block: bool,
    lines: &mut Vec<Line<'static>>,
    current_line: &mut Vec<Span<'static>>,
    pending_prefix: &mut Option<String>,
) {
    if !in_code_block {
        maybe_apply_prefix(current_line, pending_prefix);
        current_line.push(Span::styled(text.to_string(), style));
        return;
    }

    let mut segments = text.split('\n').peekable();
    let mut first = true;
    while let Some(segment) = segments.next() {
        if !first {
            flush_line(lines, current_line);
        }
        first = false;
        if segment.is_empty() {
            if segments.peek().is_some() {
                lines.push(Line::default());
            }
            continue;
        }
        maybe_apply_prefix(current_line, pending_prefix);
        current_line.push(Span::styled(segment.to_string(), style));
    }
}

fn flush_line(lines: &mut Vec<Line<'static>>, current_line: &mut Vec<Span<'static>>) {
    if current_line.is_empty() {
        return;
    }
    lines.push(Line::from(std::mem::take(current_line)));
}

fn push_style<F>(stack: &mut Vec<Style>, f: F)
where
    F: FnOnce(Style) -> Style,
{
    let base = stack.last().cloned().unwrap_or_default();
    stack.push(f(base));
}

fn pop_style(stack: &mut Vec<Style>) {
    if stack.len() > 1 {
        stack.pop();
    }
}

fn current_style(stack: &[Style]) -> Style {
    stack.last().cloned().unwrap_or_default()
}

fn maybe_apply_prefix(current_line: &mut Vec<Span<'static>>, pending_prefix: &mut Option<String>) {
    if current_line.is_empty()
        && let Some(prefix) = pending_prefix.take()
    {
        current_line.push(Span::raw(prefix));
    }
}

/// Word headings (`### Word (noun)`) get the accent color.
fn heading_style(level: HeadingLevel) -> Style {
    let style = Style::default().add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 | HeadingLevel::H2 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H3 => style.fg(Palette::ACCENT.tui()),
        _ => style,
    }
}

#[derive(Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

impl From<Option<u64>> for ListKind {
    fn from(value: Option<u64>) -> Self {
        match value {
            Some(n) if n > 0 => ListKind::Ordered(n),
            Some(_) => ListKind::Ordered(1),
            None => ListKind::Unordered,
        }
    }
}

impl ListKind {
    fn next_marker(&mut self) -> String {
        match self {
            ListKind::Unordered => "- ".to_string(),
            ListKind::Ordered(n) => {
                let marker = format!("{}. ", *n);
                *n += 1;
                marker
            }
        }
    }
}

fn list_prefix(stack: &mut [ListKind]) -> String {
    let indent = "  ".repeat(stack.len().saturating_sub(1));
    if let Some(kind) = stack.last_mut() {
        format!("{indent}{}", kind.next_marker())
    } else {
        "- ".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::render_markdown;
    use proptest::prelude::*;
    use ratatui::style::Modifier;
    use ratatui::text::Line;

    fn flatten(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    proptest! {
        #[test]
        fn never_panics(content in "\\PC*") {
            render_markdown(&content);
        }
    }

    #[test]
    fn renders_word_entry() {
        let text = render_markdown(
            "### Serene (adjective)\n- Meaning: calm\n- Example: The lake was serene.",
        );
        let rendered: Vec<String> = text.lines.iter().map(flatten).collect();

        assert_eq!(rendered[0], "Serene (adjective)");
        assert!(rendered[1].is_empty());
        assert_eq!(rendered[2], "- Meaning: calm");
        assert_eq!(rendered[3], "- Example: The lake was serene.");

        let heading = &text.lines[0].spans[0];
        assert!(heading.style.add_modifier.contains(Modifier::BOLD));
        assert!(heading.style.fg.is_some());
    }

    #[test]
    fn numbers_ordered_lists() {
        let text = render_markdown("1. first\n2. second");
        let rendered: Vec<String> = text.lines.iter().map(flatten).collect();
        assert_eq!(rendered[0], "1. first");
        assert_eq!(rendered[1], "2. second");
    }

    #[test]
    fn renders_tables_row_by_row() {
        let text = render_markdown("| Word | Meaning |\n|---|---|\n| A. serene | 1. calm |");
        let rendered: Vec<String> = text.lines.iter().map(flatten).collect();
        assert_eq!(rendered[0], "Word │ Meaning");
        assert_eq!(rendered[1], "A. serene │ 1. calm");
    }
}
