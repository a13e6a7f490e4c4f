mod view;

use crate::app::shell::{AppEvent, AppShell};
use crate::browse::tags::TagGroups;
use crate::api::types::DEFAULT_TAG_SERVICE;
use crate::core::error::Result;
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

// Grid configuration
const GRID_COLUMNS: usize = 4;
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Which part of the screen receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    /// Typing tags
    Search,
    /// Moving through the thumbnail grid
    Grid,
    /// Single file open with its tag list
    Viewer,
}

/// Interactive terminal browser
pub struct BrowserTui {
    shell: AppShell,
    events: mpsc::UnboundedReceiver<AppEvent>,
    focus: Focus,
    /// Selected cell within the visible page
    selected: usize,
    /// Selected tag in the viewer, in display order
    tag_selected: usize,
}

impl BrowserTui {
    pub fn new(shell: AppShell, events: mpsc::UnboundedReceiver<AppEvent>) -> Self {
        Self {
            shell,
            events,
            focus: Focus::Search,
            selected: 0,
            tag_selected: 0,
        }
    }

    /// Run until the user quits. Must be called inside a tokio runtime.
    pub async fn run(&mut self) -> Result<()> {
        self.shell.request_api_version();
        if !self.shell.search_value().trim().is_empty() && self.shell.submit_search().is_some() {
            self.focus = Focus::Grid;
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        // Always restore terminal, even if we early-return with an error.
        struct TerminalRestore;
        impl Drop for TerminalRestore {
            fn drop(&mut self) {
                let _ = disable_raw_mode();
                let mut stdout = io::stdout();
                let _ = execute!(stdout, LeaveAlternateScreen, cursor::Show);
            }
        }
        let _restore = TerminalRestore;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;

        loop {
            while let Ok(app_event) = self.events.try_recv() {
                self.shell.handle_event(app_event);
                self.clamp_selection();
            }

            let tui = &*self;
            terminal.draw(|f| view::render(f, tui))?;

            // Short poll so background completions get drawn promptly.
            let ready = tokio::task::block_in_place(|| event::poll(INPUT_POLL))?;
            if !ready {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !self.handle_key(key) {
                    break;
                }
            }
        }

        tracing::info!("tui closed");
        Ok(())
    }

    /// Returns `false` when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }

        match self.focus {
            Focus::Search => self.handle_search_key(key),
            Focus::Grid => return self.handle_grid_key(key),
            Focus::Viewer => return self.handle_viewer_key(key),
        }
        true
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.shell.submit_search();
                self.focus = Focus::Grid;
            }
            KeyCode::Esc | KeyCode::Tab => {
                self.focus = Focus::Grid;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.shell.search_value_mut().clear();
            }
            KeyCode::Char(c) => {
                self.shell.search_value_mut().push(c);
            }
            KeyCode::Backspace => {
                self.shell.search_value_mut().pop();
            }
            _ => {}
        }
    }

    fn handle_grid_key(&mut self, key: KeyEvent) -> bool {
        let page_len = self.shell.store().page().len();
        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Tab => {
                self.focus = Focus::Search;
            }
            KeyCode::Left => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.selected + 1 < page_len {
                    self.selected += 1;
                }
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(GRID_COLUMNS);
            }
            KeyCode::Down => {
                if self.selected + GRID_COLUMNS < page_len {
                    self.selected += GRID_COLUMNS;
                }
            }
            KeyCode::PageDown | KeyCode::Char('n') | KeyCode::Char(']') => {
                if self.shell.next_page() {
                    self.selected = 0;
                }
            }
            KeyCode::PageUp | KeyCode::Char('p') | KeyCode::Char('[') => {
                if self.shell.prev_page() {
                    self.selected = 0;
                }
            }
            KeyCode::Home => {
                self.shell.set_page(1);
                self.selected = 0;
            }
            KeyCode::End => {
                let last = self.shell.store().total_pages();
                self.shell.set_page(last);
                self.selected = 0;
            }
            KeyCode::Enter => {
                if self.shell.open(self.selected) {
                    self.tag_selected = 0;
                    self.focus = Focus::Viewer;
                }
            }
            _ => {}
        }
        true
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Esc | KeyCode::Backspace => {
                self.shell.close();
                self.focus = Focus::Grid;
            }
            KeyCode::Char('s') => {
                self.shell.save_open_item();
            }
            KeyCode::Up => {
                self.tag_selected = self.tag_selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.tag_selected + 1 < self.open_item_tags().len() {
                    self.tag_selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(tag) = self.open_item_tags().get(self.tag_selected).cloned() {
                    self.shell.search_from_tag(&tag);
                    self.selected = 0;
                    self.focus = Focus::Grid;
                }
            }
            _ => {}
        }
        true
    }

    /// Tags of the open item, in the order the viewer lists them
    fn open_item_tags(&self) -> Vec<String> {
        let Some(metadata) = self.shell.open_item().and_then(|r| r.metadata.as_ref()) else {
            return Vec::new();
        };
        TagGroups::from_tags(metadata.display_tags(DEFAULT_TAG_SERVICE))
            .ordered()
            .iter()
            .map(|t| t.value.to_string())
            .collect()
    }

    fn clamp_selection(&mut self) {
        let page_len = self.shell.store().page().len();
        if self.selected >= page_len {
            self.selected = page_len.saturating_sub(1);
        }
        if self.focus == Focus::Viewer && self.shell.open_item().is_none() {
            self.focus = Focus::Grid;
        }
    }
}
