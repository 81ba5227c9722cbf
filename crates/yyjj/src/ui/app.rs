//! Application loop for the TUI.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use time::OffsetDateTime;

use crate::app::convert::SerdeConverter;
use crate::app::io::{export_to_dir, import_path};
use crate::app::sync::{DEFAULT_JSONC, Firing, SyncEngine};
use crate::domain::model::{Pane, PerPane};
use crate::infra::config::Config;
use crate::ui::components::command_palette::{
    CommandPalette, CommandPaletteState, PaletteCommand,
};
use crate::ui::components::editor_pane::{EditKey, EditorPane, EditorPaneState};

const TICK_RATE: Duration = Duration::from_millis(120);
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Two-pane JSONC/YAML editor.
pub struct UiApp {
    config: Config,
    engine: SyncEngine,
    panes: PerPane<EditorPaneState>,
    focus: Pane,
    editor: EditorPane,
    palette_state: CommandPaletteState,
    palette_component: CommandPalette,
    status: Option<StatusMessage>,
    should_quit: bool,
}

impl UiApp {
    /// Start a session using `config`, seeding the JSONC pane with the configured sample.
    pub fn new(config: Config, now: Instant) -> Self {
        let sample = config
            .sample_text()
            .unwrap_or_else(|| DEFAULT_JSONC.to_owned());
        let engine = SyncEngine::start(
            SerdeConverter::new(),
            sample,
            config.sync.quiet_interval(),
            now,
        );
        Self {
            config,
            engine,
            panes: PerPane::default(),
            focus: Pane::Jsonc,
            editor: EditorPane,
            palette_state: CommandPaletteState::default(),
            palette_component: CommandPalette,
            status: None,
            should_quit: false,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    /// Import `path` into `pane`, reporting the result on the status line.
    pub fn import(&mut self, pane: Pane, path: &Path, now: Instant) -> Result<Firing> {
        let outcome = import_path(&mut self.engine, pane, path, now)?;
        match outcome {
            Firing::Converted => self.set_status(
                StatusLevel::Success,
                format!("Imported {} into {pane}", path.display()),
                now,
            ),
            _ => self.set_status(
                StatusLevel::Error,
                format!("Imported {} with errors", path.display()),
                now,
            ),
        }
        Ok(outcome)
    }

    /// Launch the terminal UI and enter the event loop.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to initialize terminal")?;

        let event_loop_result = self.event_loop(&mut terminal);

        disable_raw_mode().ok();
        let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal.show_cursor();

        event_loop_result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| self.render(frame))?;
            self.tick(Instant::now());

            if self.should_quit {
                break;
            }

            if event::poll(self.poll_timeout(Instant::now()))? {
                let ev = event::read()?;
                self.handle_event(ev, Instant::now())?;
            }
        }
        Ok(())
    }

    /// Wait no longer than the next debounce deadline.
    fn poll_timeout(&self, now: Instant) -> Duration {
        self.engine
            .next_deadline()
            .map_or(TICK_RATE, |deadline| {
                deadline.saturating_duration_since(now).min(TICK_RATE)
            })
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let size = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[0]);

        for (pane, area) in Pane::ALL.into_iter().zip(columns.iter().copied()) {
            self.editor.render(
                frame,
                area,
                pane,
                self.engine.buffer(pane),
                self.panes.get_mut(pane),
                self.focus == pane && !self.palette_state.is_open(),
            );
        }

        self.render_status(frame, layout[1]);
        self.palette_component
            .render(frame, size, &self.palette_state);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let line = match &self.status {
            Some(status) => {
                let style = match status.level {
                    StatusLevel::Info => Style::default().fg(Color::Gray),
                    StatusLevel::Success => Style::default().fg(Color::Green),
                    StatusLevel::Error => Style::default().fg(Color::Red),
                };
                Line::styled(status.text.clone(), style)
            }
            None => Line::from(vec![
                Span::styled("tab", Style::default().fg(Color::Cyan)),
                Span::raw(" switch pane · "),
                Span::styled("ctrl+o", Style::default().fg(Color::Cyan)),
                Span::raw(" import · "),
                Span::styled("ctrl+s", Style::default().fg(Color::Cyan)),
                Span::raw(" export · "),
                Span::styled("ctrl+p", Style::default().fg(Color::Cyan)),
                Span::raw(" commands · "),
                Span::styled("ctrl+q", Style::default().fg(Color::Cyan)),
                Span::raw(" quit"),
            ])
            .style(Style::default().fg(Color::DarkGray)),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Fire due debounce deadlines and expire the status line.
    pub fn tick(&mut self, now: Instant) {
        for report in self.engine.poll(now) {
            tracing::debug!(pane = %report.pane, outcome = ?report.outcome, "debounce fired");
        }
        if let Some(status) = &self.status
            && status.is_expired(now)
        {
            self.status = None;
        }
    }

    fn handle_event(&mut self, event: Event, now: Instant) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key_event(key, now)?
            }
            Event::Paste(text) if !self.palette_state.is_open() => {
                for ch in text.chars() {
                    let key = if ch == '\n' {
                        EditKey::Newline
                    } else {
                        EditKey::Char(ch)
                    };
                    self.edit_focused(key, now);
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> Result<()> {
        if self.palette_state.is_open() {
            return self.handle_palette_key(key, now);
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('s') => self.perform_export(None, now),
                KeyCode::Char('o') => self.palette_state.open_with("import "),
                KeyCode::Char('p') => self.palette_state.open_with(""),
                _ => {}
            }
            return Ok(());
        }

        let edit = match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.other();
                return Ok(());
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::ALT) => EditKey::Char(ch),
            KeyCode::Enter => EditKey::Newline,
            KeyCode::Backspace => EditKey::Backspace,
            KeyCode::Delete => EditKey::Delete,
            KeyCode::Left => EditKey::Left,
            KeyCode::Right => EditKey::Right,
            KeyCode::Up => EditKey::Up,
            KeyCode::Down => EditKey::Down,
            KeyCode::Home => EditKey::Home,
            KeyCode::End => EditKey::End,
            _ => return Ok(()),
        };
        self.edit_focused(edit, now);
        Ok(())
    }

    fn edit_focused(&mut self, key: EditKey, now: Instant) {
        let pane = self.focus;
        if let Some(text) = self.panes.get_mut(pane).apply(self.engine.text(pane), key) {
            self.engine.on_edit(pane, text, now);
        }
    }

    fn handle_palette_key(&mut self, key: KeyEvent, now: Instant) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.palette_state.close(),
            KeyCode::Enter => {
                let input = self.palette_state.submit();
                match PaletteCommand::parse(&input) {
                    Ok(Some(command)) => self.execute_command(command, now),
                    Ok(None) => {}
                    Err(message) => self.set_status(StatusLevel::Error, message, now),
                }
            }
            KeyCode::Backspace => self.palette_state.pop_char(),
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.palette_state.push_char(ch)
            }
            _ => {}
        }
        Ok(())
    }

    fn execute_command(&mut self, command: PaletteCommand, now: Instant) {
        match command {
            PaletteCommand::Import(path) => {
                if let Err(err) = self.import(self.focus, &path, now) {
                    self.set_status(StatusLevel::Error, err.to_string(), now);
                }
            }
            PaletteCommand::Export(dir) => self.perform_export(dir, now),
            PaletteCommand::Help => {
                self.set_status(StatusLevel::Info, PaletteCommand::HELP, now);
            }
            PaletteCommand::Quit => self.should_quit = true,
        }
    }

    fn perform_export(&mut self, dir: Option<PathBuf>, now: Instant) {
        let dir = dir.unwrap_or_else(|| self.config.export.dir());
        match export_to_dir(&mut self.engine, self.focus, &dir, OffsetDateTime::now_utc()) {
            Ok(path) => self.set_status(
                StatusLevel::Success,
                format!("Exported {} to {}", self.focus, path.display()),
                now,
            ),
            Err(err) => self.set_status(StatusLevel::Error, format!("{err:#}"), now),
        }
    }

    fn set_status<S: Into<String>>(&mut self, level: StatusLevel, message: S, now: Instant) {
        self.status = Some(StatusMessage {
            level,
            text: message.into(),
            expires_at: now + STATUS_TTL,
        });
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

#[derive(Debug)]
struct StatusMessage {
    level: StatusLevel,
    text: String,
    expires_at: Instant,
}

impl StatusMessage {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Clone, Copy)]
enum StatusLevel {
    Info,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_str(app: &mut UiApp, text: &str, now: Instant) -> Result<()> {
        for ch in text.chars() {
            app.handle_key_event(key(KeyCode::Char(ch)), now)?;
        }
        Ok(())
    }

    fn settled_app(start: Instant) -> UiApp {
        let mut app = UiApp::new(Config::default(), start);
        app.tick(start + Duration::from_secs(1));
        app
    }

    #[test]
    fn starts_with_synchronized_sample() {
        let app = UiApp::new(Config::default(), Instant::now());
        assert_eq!(app.engine().text(Pane::Jsonc), DEFAULT_JSONC);
        assert!(app.engine().text(Pane::Yaml).contains("name: myapp"));
        assert_eq!(app.focus(), Pane::Jsonc);
    }

    #[test]
    fn typing_in_yaml_pane_updates_jsonc_after_quiet_period() -> Result<()> {
        let start = Instant::now();
        let mut app = settled_app(start);
        let typed_at = start + Duration::from_secs(2);

        app.handle_key_event(key(KeyCode::Tab), typed_at)?;
        assert_eq!(app.focus(), Pane::Yaml);
        // Replace the YAML text: jump to the end and append a new key.
        for _ in 0..20 {
            app.handle_key_event(key(KeyCode::Down), typed_at)?;
        }
        app.handle_key_event(key(KeyCode::End), typed_at)?;
        type_str(&mut app, "extra: true", typed_at)?;

        app.tick(typed_at + Duration::from_millis(100));
        assert!(!app.engine().text(Pane::Jsonc).contains("extra"));

        app.tick(typed_at + Duration::from_millis(300));
        let json: serde_json::Value = serde_json::from_str(app.engine().text(Pane::Jsonc))?;
        assert_eq!(json["extra"], serde_json::Value::Bool(true));
        assert_eq!(json["port"], 8080);
        Ok(())
    }

    #[test]
    fn palette_import_loads_file_into_focused_pane() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("cfg.yaml");
        fs::write(&file, "x: 1")?;

        let start = Instant::now();
        let mut app = settled_app(start);
        let now = start + Duration::from_secs(2);
        app.handle_key_event(key(KeyCode::Tab), now)?;
        app.handle_key_event(ctrl('o'), now)?;
        type_str(&mut app, &file.display().to_string(), now)?;
        app.handle_key_event(key(KeyCode::Enter), now)?;

        assert_eq!(app.engine().filename(Pane::Yaml), Some("cfg.yaml"));
        assert_eq!(app.engine().text(Pane::Jsonc), "{\n  \"x\": 1\n}");
        assert!(app.status_text().is_some_and(|text| text.starts_with("Imported")));
        Ok(())
    }

    #[test]
    fn palette_reports_unknown_command() -> Result<()> {
        let start = Instant::now();
        let mut app = settled_app(start);
        app.handle_key_event(ctrl('p'), start)?;
        type_str(&mut app, "bogus", start)?;
        app.handle_key_event(key(KeyCode::Enter), start)?;
        assert_eq!(app.status_text(), Some("unknown command 'bogus'"));

        app.tick(start + STATUS_TTL);
        assert_eq!(app.status_text(), None);
        Ok(())
    }

    #[test]
    fn palette_export_writes_focused_pane() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let start = Instant::now();
        let mut app = settled_app(start);
        app.handle_key_event(ctrl('p'), start)?;
        type_str(&mut app, &format!("export {}", dir.path().display()), start)?;
        app.handle_key_event(key(KeyCode::Enter), start)?;

        let written: Vec<_> = fs::read_dir(dir.path())?.collect::<Result<_, _>>()?;
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().to_string_lossy().into_owned();
        assert!(name.starts_with("output-") && name.ends_with(".jsonc"));
        assert_eq!(fs::read_to_string(written[0].path())?, DEFAULT_JSONC);
        Ok(())
    }

    #[test]
    fn ctrl_q_quits() -> Result<()> {
        let mut app = UiApp::new(Config::default(), Instant::now());
        app.handle_key_event(ctrl('q'), Instant::now())?;
        assert!(app.should_quit());
        Ok(())
    }

    #[test]
    fn poll_timeout_tracks_next_deadline() {
        let start = Instant::now();
        let app = UiApp::new(Config::default(), start);
        // The startup echo is due one quiet interval after start.
        assert_eq!(app.poll_timeout(start + Duration::from_millis(250)), Duration::from_millis(50));
        assert_eq!(app.poll_timeout(start + Duration::from_secs(5)), Duration::ZERO);
    }
}
