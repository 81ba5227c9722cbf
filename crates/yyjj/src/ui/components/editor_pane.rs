//! Editor pane component: one buffer with its title, cursor, and error footer.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::domain::errors::ParseError;
use crate::domain::model::{Buffer, Pane};

/// Edit requested by a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Newline,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Cursor and scroll position for one pane.
///
/// The pane never keeps its own copy of the text. Every edit takes the engine's current text and
/// returns the replacement, leaving the cursor at a valid char boundary.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditorPaneState {
    cursor: usize,
    scroll: u16,
}

impl EditorPaneState {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor back inside `text` after the buffer changed underneath it.
    pub fn clamp(&mut self, text: &str) {
        let mut cursor = self.cursor.min(text.len());
        while !text.is_char_boundary(cursor) {
            cursor -= 1;
        }
        self.cursor = cursor;
    }

    /// Apply `key` to `text`. Returns the new text when the key modified it.
    pub fn apply(&mut self, text: &str, key: EditKey) -> Option<String> {
        self.clamp(text);
        let cursor = self.cursor;
        match key {
            EditKey::Char(ch) => Some(self.insert(text, cursor, ch)),
            EditKey::Newline => Some(self.insert(text, cursor, '\n')),
            EditKey::Backspace => {
                let start = previous_boundary(text, cursor)?;
                self.cursor = start;
                Some(splice(text, start, cursor, ""))
            }
            EditKey::Delete => {
                let end = next_boundary(text, cursor)?;
                Some(splice(text, cursor, end, ""))
            }
            EditKey::Left => {
                self.cursor = previous_boundary(text, cursor).unwrap_or(cursor);
                None
            }
            EditKey::Right => {
                self.cursor = next_boundary(text, cursor).unwrap_or(cursor);
                None
            }
            EditKey::Up | EditKey::Down => {
                let (line, column) = line_column(text, cursor);
                let target = if key == EditKey::Up {
                    line.checked_sub(1)
                } else {
                    Some(line + 1)
                };
                if let Some(target) = target
                    && let Some(offset) = offset_of(text, target, column)
                {
                    self.cursor = offset;
                }
                None
            }
            EditKey::Home => {
                self.cursor = line_start(text, cursor);
                None
            }
            EditKey::End => {
                self.cursor = text[cursor..]
                    .find('\n')
                    .map_or(text.len(), |idx| cursor + idx);
                None
            }
        }
    }

    fn insert(&mut self, text: &str, cursor: usize, ch: char) -> String {
        let mut buf = [0u8; 4];
        self.cursor = cursor + ch.len_utf8();
        splice(text, cursor, cursor, ch.encode_utf8(&mut buf))
    }

    /// Zero-based (line, char column) of the cursor.
    pub fn position(&self, text: &str) -> (usize, usize) {
        line_column(text, self.cursor.min(text.len()))
    }

    /// Terminal cells between the start of the cursor's line and the cursor.
    pub fn display_column(&self, text: &str) -> usize {
        let cursor = self.cursor.min(text.len());
        text[line_start(text, cursor)..cursor].width()
    }

    fn scroll_to(&mut self, cursor_line: usize, height: u16) {
        let line = u16::try_from(cursor_line).unwrap_or(u16::MAX);
        if line < self.scroll {
            self.scroll = line;
        } else if height > 0 && line >= self.scroll.saturating_add(height) {
            self.scroll = line + 1 - height;
        }
    }
}

fn splice(text: &str, start: usize, end: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(replacement);
    out.push_str(&text[end..]);
    out
}

fn previous_boundary(text: &str, cursor: usize) -> Option<usize> {
    text[..cursor].char_indices().next_back().map(|(idx, _)| idx)
}

fn next_boundary(text: &str, cursor: usize) -> Option<usize> {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map_or(0, |idx| idx + 1)
}

fn line_column(text: &str, cursor: usize) -> (usize, usize) {
    let line = text[..cursor].matches('\n').count();
    let column = text[line_start(text, cursor)..cursor].chars().count();
    (line, column)
}

/// Byte offset of `column` on `line`, clamped to the line's end.
fn offset_of(text: &str, line: usize, column: usize) -> Option<usize> {
    let mut start = 0;
    for _ in 0..line {
        start += text[start..].find('\n')? + 1;
    }
    let end = text[start..].find('\n').map_or(text.len(), |idx| start + idx);
    let offset = text[start..end]
        .char_indices()
        .nth(column)
        .map_or(end, |(idx, _)| start + idx);
    Some(offset)
}

/// Ratatui component drawing one buffer.
#[derive(Debug, Default)]
pub struct EditorPane;

impl EditorPane {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        pane: Pane,
        buffer: &Buffer,
        state: &mut EditorPaneState,
        has_focus: bool,
    ) {
        let footer_height = if buffer.error.is_some() { 3 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
            .split(area);

        let border_color = if has_focus {
            Color::Cyan
        } else {
            Color::DarkGray
        };
        let block = Block::default()
            .title(title_line(pane, buffer))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(chunks[0]);

        state.clamp(&buffer.text);
        let (line, _) = state.position(&buffer.text);
        let column = state.display_column(&buffer.text);
        state.scroll_to(line, inner.height);

        let lines: Vec<Line<'_>> = buffer.text.split('\n').map(Line::raw).collect();
        let editor = Paragraph::new(lines)
            .block(block)
            .scroll((state.scroll, 0));
        frame.render_widget(editor, chunks[0]);

        if has_focus {
            let x = inner
                .x
                .saturating_add(u16::try_from(column).unwrap_or(u16::MAX));
            let row = u16::try_from(line)
                .unwrap_or(u16::MAX)
                .saturating_sub(state.scroll);
            let y = inner.y.saturating_add(row);
            if x < inner.x + inner.width && y < inner.y + inner.height {
                frame.set_cursor(x, y);
            }
        }

        if let Some(error) = &buffer.error {
            frame.render_widget(error_footer(error), chunks[1]);
        }
    }
}

fn title_line(pane: Pane, buffer: &Buffer) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {} ", pane.title()),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(filename) = &buffer.filename {
        spans.push(Span::styled(
            format!("{filename} "),
            Style::default().fg(Color::Gray),
        ));
    }
    if buffer.error.is_some() {
        spans.push(Span::styled(
            " Error ",
            Style::default().fg(Color::White).bg(Color::Red),
        ));
    }
    Line::from(spans)
}

fn error_footer(error: &ParseError) -> Paragraph<'static> {
    let line = Line::from(vec![
        Span::styled(
            format!("{}  ", error.location()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(error.message.clone(), Style::default().fg(Color::Red)),
    ]);
    Paragraph::new(line)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_all(state: &mut EditorPaneState, text: &str, keys: &[EditKey]) -> String {
        let mut current = text.to_owned();
        for key in keys {
            if let Some(next) = state.apply(&current, *key) {
                current = next;
            }
        }
        current
    }

    #[test]
    fn typing_inserts_at_cursor() {
        let mut state = EditorPaneState::default();
        let text = type_all(
            &mut state,
            "{}",
            &[EditKey::Right, EditKey::Char('"'), EditKey::Char('a'), EditKey::Char('"')],
        );
        assert_eq!(text, "{\"a\"}");
        assert_eq!(state.cursor(), 4);
    }

    #[test]
    fn navigation_keys_do_not_edit() {
        let mut state = EditorPaneState::default();
        for key in [EditKey::Left, EditKey::Right, EditKey::Up, EditKey::Down, EditKey::End] {
            assert_eq!(state.apply("ab\ncd", key), None);
        }
    }

    #[test]
    fn backspace_and_delete_respect_char_boundaries() {
        let mut state = EditorPaneState::default();
        let text = type_all(&mut state, "aé", &[EditKey::End, EditKey::Backspace]);
        assert_eq!(text, "a");
        assert_eq!(state.cursor(), 1);

        let mut state = EditorPaneState::default();
        let text = type_all(&mut state, "éb", &[EditKey::Delete]);
        assert_eq!(text, "b");
        assert_eq!(state.apply("", EditKey::Backspace), None);
    }

    #[test]
    fn vertical_movement_keeps_column_where_possible() {
        let text = "abcd\nx\nwxyz";
        let mut state = EditorPaneState::default();
        type_all(&mut state, text, &[EditKey::Right, EditKey::Right, EditKey::Right]);
        state.apply(text, EditKey::Down);
        assert_eq!(state.position(text), (1, 1));
        state.apply(text, EditKey::Down);
        assert_eq!(state.position(text), (2, 1));
        state.apply(text, EditKey::Up);
        state.apply(text, EditKey::Up);
        assert_eq!(state.position(text), (0, 1));
        state.apply(text, EditKey::Up);
        assert_eq!(state.position(text), (0, 1));
    }

    #[test]
    fn newline_and_home_end() {
        let mut state = EditorPaneState::default();
        let text = type_all(&mut state, "ab", &[EditKey::End, EditKey::Newline, EditKey::Char('c')]);
        assert_eq!(text, "ab\nc");
        state.apply(&text, EditKey::Home);
        assert_eq!(state.position(&text), (1, 0));
    }

    #[test]
    fn display_column_counts_wide_characters() {
        let text = "{\n  // 設定\n}";
        let mut state = EditorPaneState::default();
        type_all(&mut state, text, &[EditKey::Down, EditKey::End]);
        assert_eq!(state.position(text), (1, 7));
        assert_eq!(state.display_column(text), 9);
    }

    #[test]
    fn clamp_after_external_rewrite() {
        let mut state = EditorPaneState::default();
        type_all(&mut state, "long text here", &[EditKey::End]);
        state.clamp("é");
        assert_eq!(state.cursor(), 2);
        state.clamp("éa");
        assert_eq!(state.cursor(), 2);
        state.clamp("a\u{e9}");
        assert_eq!(state.cursor(), 1);
        state.clamp("");
        assert_eq!(state.cursor(), 0);
    }
}
