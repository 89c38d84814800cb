//! Defines the core state structures for the console.
//!
//! This module contains the central `App` struct that holds the entire state
//! of the TUI. It also defines the per-screen sub-states (agent form, knowledge
//! manager, chat) and the overlays (input prompts, delete confirmation).

use std::time::{Duration, Instant};

use crate::client::Clients;
use crate::config::{ClientMode, ConsoleConfig};
use crate::forms::{AgentFormValues, FormField, ValidationErrors};
use crate::i18n::{Language, Locale};
use crate::state::{AgentsState, ChatState, KnowledgeState};

/// The screen currently shown in the body area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Agents,
    AgentForm,
    Knowledge,
    Chat,
}

/// The main application state.
pub struct App {
    // --- Core State ---
    /// Flag to indicate if the application should quit.
    pub should_quit: bool,
    pub screen: Screen,
    pub locale: Locale,
    pub mode: ClientMode,

    // --- Screens ---
    pub agents: AgentsState,
    /// Index of the highlighted row in the agent list.
    pub agent_cursor: usize,
    pub form: Option<AgentFormState>,
    pub knowledge: Option<KnowledgePane>,
    pub chat: Option<ChatPane>,

    // --- UI ---
    /// The message currently displayed in the status bar.
    pub status_message: String,
    /// The currently active overlay, if any.
    pub overlay: Option<OverlayState>,
    pub(crate) spinner_frame: usize,

    // --- Internal ---
    pub(crate) clients: Clients,
    pub(crate) config: ConsoleConfig,
    pub(crate) last_tick: Instant,
    pub(crate) tick_rate: Duration,
}

impl App {
    pub fn lang(&self) -> &'static dyn Language {
        self.locale.strings()
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// True while any request of the visible screen is in flight.
    pub fn is_loading(&self) -> bool {
        match self.screen {
            Screen::Agents | Screen::AgentForm => self.agents.loading(),
            Screen::Knowledge => self
                .knowledge
                .as_ref()
                .is_some_and(|pane| pane.state.loading()),
            Screen::Chat => self.chat.as_ref().is_some_and(|pane| pane.state.loading()),
        }
    }

    /// The error banner text for the visible screen.
    pub fn banner(&self) -> Option<&str> {
        match self.screen {
            Screen::Agents | Screen::AgentForm => self.agents.error(),
            Screen::Knowledge => self.knowledge.as_ref().and_then(|pane| pane.state.error()),
            Screen::Chat => self.chat.as_ref().and_then(|pane| pane.state.error()),
        }
    }

    pub fn dismiss_banner(&mut self) {
        match self.screen {
            Screen::Agents | Screen::AgentForm => self.agents.dismiss_error(),
            Screen::Knowledge => {
                if let Some(pane) = self.knowledge.as_mut() {
                    pane.state.dismiss_error();
                }
            }
            Screen::Chat => {
                if let Some(pane) = self.chat.as_mut() {
                    pane.state.dismiss_error();
                }
            }
        }
    }
}

/// State of the create/edit agent form.
#[derive(Debug, Clone)]
pub struct AgentFormState {
    pub values: AgentFormValues,
    pub focused: FormField,
    pub errors: ValidationErrors,
    /// Id of the agent being edited; `None` when creating.
    pub editing: Option<String>,
    /// Set after the first submit attempt; errors then update as the user types.
    pub submitted: bool,
    /// Whether the user has typed anything since the form was opened.
    pub dirty: bool,
}

impl AgentFormState {
    pub fn create() -> Self {
        Self {
            values: AgentFormValues::default(),
            focused: FormField::Name,
            errors: ValidationErrors::new(),
            editing: None,
            submitted: false,
            dirty: false,
        }
    }

    pub fn edit(agent_id: impl Into<String>, values: AgentFormValues) -> Self {
        Self {
            values,
            editing: Some(agent_id.into()),
            ..Self::create()
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        self.values.get_mut(self.focused).push(ch);
        self.touched();
    }

    pub fn backspace(&mut self) {
        self.values.get_mut(self.focused).pop();
        self.touched();
    }

    pub fn clear_field(&mut self) {
        self.values.get_mut(self.focused).clear();
        self.touched();
    }

    pub fn focus_next(&mut self) {
        self.focused = self.focused.next();
    }

    pub fn focus_previous(&mut self) {
        self.focused = self.focused.previous();
    }

    fn touched(&mut self) {
        self.dirty = true;
        if self.submitted {
            match self.values.check(self.focused) {
                Some(error) => self.errors.insert(self.focused, error),
                None => self.errors.clear_field(self.focused),
            }
        }
    }
}

/// Knowledge manager for one agent.
pub struct KnowledgePane {
    pub state: KnowledgeState,
    pub agent_name: String,
    pub selected: usize,
}

impl KnowledgePane {
    pub fn new(state: KnowledgeState, agent_name: impl Into<String>) -> Self {
        Self {
            state,
            agent_name: agent_name.into(),
            selected: 0,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        self.selected = step(self.selected, delta, self.state.items().len());
    }

    pub fn clamp_selection(&mut self) {
        self.selected = step(self.selected, 0, self.state.items().len());
    }
}

/// Test chat with one agent.
pub struct ChatPane {
    pub state: ChatState,
    pub agent_name: String,
    pub composer: Composer,
    /// Rows scrolled up from the newest message.
    pub scroll_back: usize,
}

impl ChatPane {
    pub fn new(state: ChatState, agent_name: impl Into<String>) -> Self {
        Self {
            state,
            agent_name: agent_name.into(),
            composer: Composer::new(),
            scroll_back: 0,
        }
    }
}

/// Moves `current` by `delta` inside `0..len`, clamping at both ends.
pub(crate) fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = current as isize + delta;
    next.clamp(0, len as isize - 1) as usize
}

/// Single-line text input for the chat, with a history of sent messages.
#[derive(Clone, Debug, Default)]
pub struct Composer {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.history_index = None;
    }

    pub fn backspace(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.history_index = None;
        }
    }

    pub fn delete(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.buffer.drain(self.cursor..self.cursor + ch.len_utf8());
            self.history_index = None;
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Takes the buffer, remembering it in the history.
    pub fn take(&mut self) -> String {
        let content = std::mem::take(&mut self.buffer);
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.cursor = 0;
        self.history_index = None;
        content
    }

    pub fn history_previous(&mut self) -> bool {
        let target = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None if self.history.is_empty() => return false,
            None => self.history.len() - 1,
        };
        self.load_history(target)
    }

    pub fn history_next(&mut self) -> bool {
        match self.history_index {
            Some(idx) if idx + 1 < self.history.len() => self.load_history(idx + 1),
            Some(_) => {
                self.history_index = None;
                self.buffer.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn load_history(&mut self, index: usize) -> bool {
        let Some(entry) = self.history.get(index) else {
            return false;
        };
        self.buffer = entry.clone();
        self.cursor = self.buffer.len();
        self.history_index = Some(index);
        true
    }

    /// Display column of the cursor, counting wide characters as two cells.
    pub fn cursor_column(&self) -> u16 {
        let width: usize = self.buffer[..self.cursor]
            .chars()
            .map(|ch| unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1).max(1))
            .sum();
        width.min(u16::MAX as usize) as u16
    }
}

/// Overlays capture all keyboard input while open.
#[derive(Debug, Clone)]
pub enum OverlayState {
    InputPrompt(InputPromptState),
    ConfirmDelete(ConfirmDeleteState),
}

/// Actions that need a line of text from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInputAction {
    AddText,
    AddUrl,
    UploadFile,
}

#[derive(Debug, Clone)]
pub struct InputPromptState {
    pub title: String,
    pub placeholder: String,
    pub value: String,
    pub action: PendingInputAction,
    pub error: Option<String>,
}

impl InputPromptState {
    pub fn new(action: PendingInputAction, lang: &dyn Language) -> Self {
        let (title, placeholder) = match action {
            PendingInputAction::AddText => (lang.add_text_title(), lang.text_placeholder()),
            PendingInputAction::AddUrl => (lang.add_url_title(), lang.url_placeholder()),
            PendingInputAction::UploadFile => (lang.upload_file_title(), lang.file_placeholder()),
        };
        Self {
            title: title.into(),
            placeholder: placeholder.into(),
            value: String::new(),
            action,
            error: None,
        }
    }
}

/// What a delete confirmation removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Agent { id: String, name: String },
    Knowledge { id: String },
}

#[derive(Debug, Clone)]
pub struct ConfirmDeleteState {
    pub target: DeleteTarget,
    /// 0 = delete, 1 = cancel.
    pub selected_index: usize,
}

impl ConfirmDeleteState {
    pub fn new(target: DeleteTarget) -> Self {
        Self {
            target,
            selected_index: 1,
        }
    }

    pub fn toggle_selection(&mut self) {
        self.selected_index = (self.selected_index + 1) % 2;
    }

    pub fn confirm_selected(&self) -> bool {
        self.selected_index == 0
    }
}
