//! Command palette for import/export actions.

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Parsed palette input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteCommand {
    /// Import a file into the focused pane.
    Import(PathBuf),
    /// Export the focused pane, optionally into a specific directory.
    Export(Option<PathBuf>),
    Help,
    Quit,
}

impl PaletteCommand {
    pub const HELP: &'static str = "Commands: import <path>, export [dir], help, quit";

    /// Parse a command line. Empty input yields `Ok(None)`.
    pub fn parse(input: &str) -> Result<Option<Self>, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = input
            .split_once(char::is_whitespace)
            .map_or((input, ""), |(verb, rest)| (verb, rest.trim()));

        let command = match verb {
            "import" | "i" | "open" => {
                if rest.is_empty() {
                    return Err("import requires a file path".into());
                }
                PaletteCommand::Import(PathBuf::from(rest))
            }
            "export" | "e" | "save" => {
                PaletteCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest)))
            }
            "help" | "?" => PaletteCommand::Help,
            "quit" | "q" => PaletteCommand::Quit,
            other => return Err(format!("unknown command '{other}'")),
        };
        Ok(Some(command))
    }
}

/// Input state backing the palette overlay.
#[derive(Debug, Default, Clone)]
pub struct CommandPaletteState {
    visible: bool,
    input: String,
}

impl CommandPaletteState {
    /// Reveal the palette with `prefill` already typed.
    pub fn open_with<S: Into<String>>(&mut self, prefill: S) {
        self.visible = true;
        self.input = prefill.into();
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.input.clear();
    }

    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Close the palette and hand back what was typed.
    pub fn submit(&mut self) -> String {
        self.visible = false;
        std::mem::take(&mut self.input)
    }
}

/// Overlay drawn at the bottom of the screen while the palette is open.
#[derive(Debug, Default)]
pub struct CommandPalette;

impl CommandPalette {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, state: &CommandPaletteState) {
        if !state.is_open() {
            return;
        }

        let width = area.width.saturating_sub(10).min(80);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + area.height.saturating_sub(5),
            width,
            height: 3.min(area.height),
        };
        frame.render_widget(Clear, popup);

        let prompt = Line::from(vec![
            Span::styled(":", Style::default().fg(Color::Cyan)),
            Span::raw(state.input().to_owned()),
        ]);
        let paragraph = Paragraph::new(prompt).block(
            Block::default()
                .title("Command (Enter to run, Esc to cancel)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(paragraph, popup);
    }
}
