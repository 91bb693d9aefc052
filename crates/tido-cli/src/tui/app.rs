//! TUI application state

use crossterm::event::{KeyCode, KeyEvent};
use tido_core::{Snapshot, TodoStore};

/// Which input target key presses go to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Navigating the list
    Normal,
    /// Typing a new item's text
    Input,
}

/// TUI state: the store plus the view of it being rendered
pub struct App {
    pub store: TodoStore,
    /// The list currently on screen; refreshed after every mutation
    pub items: Snapshot,
    pub selected: usize,
    pub input_mode: InputMode,
    pub input: String,
    /// Whether a remote observation is feeding this session
    pub synced: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: TodoStore, synced: bool) -> Self {
        let items = store.current_snapshot();
        Self {
            store,
            items,
            selected: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            synced,
            should_quit: false,
        }
    }

    /// Replace the list with a remote snapshot
    pub fn apply_remote(&mut self, snapshot: Snapshot) {
        self.store.apply_remote(snapshot.as_ref().clone());
        self.refresh();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(key.code),
            InputMode::Input => self.handle_input_key(key.code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('d') | KeyCode::Char('x') => self.delete_selected(),
            KeyCode::Char('a') | KeyCode::Char('i') => {
                self.input.clear();
                self.input_mode = InputMode::Input;
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => self.commit_input(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn commit_input(&mut self) {
        let text = self.input.trim().to_string();
        self.input.clear();
        self.input_mode = InputMode::Normal;
        if text.is_empty() {
            return;
        }
        self.store.add(text);
        self.refresh();
        // Select the item just added
        self.selected = self.items.len().saturating_sub(1);
    }

    fn toggle_selected(&mut self) {
        if let Some(item) = self.items.get(self.selected) {
            let id = item.id.clone();
            self.store.toggle(&id);
            self.refresh();
        }
    }

    fn delete_selected(&mut self) {
        if let Some(item) = self.items.get(self.selected) {
            let id = item.id.clone();
            self.store.delete(&id);
            self.refresh();
        }
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.items.len() {
            self.selected += 1;
        }
    }

    fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn refresh(&mut self) {
        self.items = self.store.current_snapshot();
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }
}
