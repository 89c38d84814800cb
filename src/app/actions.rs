use log::debug;

use super::{AgentFormState, App, ChatPane, KnowledgePane, Screen};
use crate::forms::AgentFormValues;
use crate::model::{Agent, AgentUpdate};
use crate::state::{ChatState, KnowledgeState};

impl App {
    /// The agent under the list cursor.
    pub fn highlighted_agent(&self) -> Option<&Agent> {
        self.agents.agents().get(self.agent_cursor)
    }

    pub(crate) fn move_agent_cursor(&mut self, delta: isize) {
        self.agent_cursor = super::state::step(self.agent_cursor, delta, self.agents.agents().len());
    }

    pub(crate) fn open_create_form(&mut self) {
        debug!("opening create form");
        self.form = Some(AgentFormState::create());
        self.screen = Screen::AgentForm;
    }

    /// Opens the edit form pre-filled from the list and reloads the agent.
    pub(crate) fn open_edit_form(&mut self) {
        let Some(agent) = self.highlighted_agent() else {
            self.status_message = self.lang().status_no_selection().into();
            return;
        };
        let id = agent.id.clone();
        self.form = Some(AgentFormState::edit(id.clone(), AgentFormValues::from_agent(agent)));
        self.screen = Screen::AgentForm;
        self.agents.fetch(&id);
    }

    pub(crate) fn open_knowledge(&mut self) {
        let Some(agent) = self.highlighted_agent() else {
            self.status_message = self.lang().status_no_selection().into();
            return;
        };
        let (id, name) = (agent.id.clone(), agent.name.clone());
        self.open_knowledge_for(&id, &name);
    }

    pub(crate) fn open_knowledge_for(&mut self, agent_id: &str, agent_name: &str) {
        let mut state = KnowledgeState::new(self.clients.knowledge.clone(), agent_id);
        state.refresh();
        self.knowledge = Some(KnowledgePane::new(state, agent_name));
        self.screen = Screen::Knowledge;
    }

    pub(crate) fn open_chat(&mut self) {
        let Some(agent) = self.highlighted_agent() else {
            self.status_message = self.lang().status_no_selection().into();
            return;
        };
        let mut state = ChatState::new(self.clients.chat.clone(), agent.id.clone());
        let name = agent.name.clone();
        state.refresh();
        self.chat = Some(ChatPane::new(state, name));
        self.screen = Screen::Chat;
    }

    /// Leaves a sub-screen and reloads the list so knowledge counts stay current.
    pub(crate) fn back_to_agents(&mut self) {
        self.form = None;
        self.knowledge = None;
        self.chat = None;
        self.screen = Screen::Agents;
        self.agents.refresh();
    }

    /// Validates the form; on success starts create or update and returns to the list.
    pub(crate) fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        form.submitted = true;
        let draft = match form.values.validate() {
            Ok(draft) => draft,
            Err(errors) => {
                if let Some(first) = errors.fields().next() {
                    form.focused = first;
                }
                form.errors = errors;
                self.status_message = self.lang().status_form_invalid().into();
                return;
            }
        };
        match form.editing.clone() {
            Some(id) => self.agents.edit(&id, AgentUpdate::from(draft)),
            None => self.agents.create(draft),
        }
        self.form = None;
        self.screen = Screen::Agents;
        self.status_message = self.lang().loading().into();
    }

    pub(crate) fn toggle_language(&mut self) {
        self.locale = self.locale.toggle();
        self.status_message = self.lang().status_language();
        debug!("language switched to {}", self.locale.code());
    }
}
