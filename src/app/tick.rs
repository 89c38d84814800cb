use log::debug;

use super::{App, AgentFormState, Screen};
use crate::forms::AgentFormValues;
use crate::state::{AgentsEvent, ChatEvent, KnowledgeEvent};

const SPINNER_FRAMES: usize = 4;

impl App {
    /// Called on every tick of the event loop.
    ///
    /// Applies whatever the background requests have delivered since the last tick
    /// and turns the results into status messages.
    pub fn on_tick(&mut self) {
        if self.last_tick.elapsed() >= self.tick_rate {
            self.last_tick = std::time::Instant::now();
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES;
        }

        for event in self.agents.poll() {
            self.on_agents_event(event);
        }

        let lang = self.lang();
        if let Some(pane) = self.knowledge.as_mut() {
            for event in pane.state.poll() {
                match event {
                    KnowledgeEvent::Loaded(_) => {}
                    KnowledgeEvent::Added(_) => {
                        self.status_message = lang.status_knowledge_added().into();
                        pane.selected = pane.state.items().len().saturating_sub(1);
                    }
                    KnowledgeEvent::Removed(_) => {
                        self.status_message = lang.status_knowledge_deleted().into();
                    }
                }
            }
            pane.clamp_selection();
        }

        if let Some(pane) = self.chat.as_mut() {
            for event in pane.state.poll() {
                match event {
                    ChatEvent::Loaded(_) => {}
                    ChatEvent::Replied { .. } => {
                        self.status_message = lang.status_reply_received().into();
                    }
                    ChatEvent::Cleared => {
                        self.status_message = lang.status_chat_cleared().into();
                        pane.scroll_back = 0;
                    }
                }
            }
        }
    }

    fn on_agents_event(&mut self, event: AgentsEvent) {
        let lang = self.lang();
        match event {
            AgentsEvent::Listed(_) => {
                self.move_agent_cursor(0);
            }
            AgentsEvent::Fetched(id, Some(agent)) => {
                // Only replace values the user has not started editing.
                if let Some(form) = self.form.as_mut()
                    && form.editing.as_deref() == Some(id.as_str())
                    && !form.dirty
                {
                    debug!("refreshing form values for {id}");
                    *form = AgentFormState::edit(id, AgentFormValues::from_agent(&agent));
                }
            }
            AgentsEvent::Fetched(_, None) => {}
            AgentsEvent::Created(agent) => {
                self.status_message = lang.status_agent_created(&agent.name);
                self.agent_cursor = self.agents.agents().len().saturating_sub(1);
                if self.screen == Screen::Agents && self.overlay.is_none() {
                    self.open_knowledge_for(&agent.id, &agent.name);
                }
            }
            AgentsEvent::Updated(_, Some(agent)) => {
                self.status_message = lang.status_agent_updated(&agent.name);
            }
            AgentsEvent::Updated(id, None) => {
                self.status_message = lang.agent_not_found(&id);
            }
            AgentsEvent::Removed(_, removed) => {
                if removed {
                    self.status_message = lang.status_agent_deleted().into();
                }
                self.move_agent_cursor(0);
            }
        }
    }
}
