use log::info;

use crate::client::AgentClient;
use crate::model::{Agent, AgentDraft, AgentUpdate};

use super::{Outcome, StateCore};

/// Applied results of agent requests.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentsEvent {
    Listed(Vec<Agent>),
    Fetched(String, Option<Agent>),
    Created(Agent),
    Updated(String, Option<Agent>),
    Removed(String, bool),
}

/// State behind the agent list and the agent form.
pub struct AgentsState {
    client: AgentClient,
    agents: Vec<Agent>,
    selected: Option<Agent>,
    core: StateCore<AgentsEvent>,
}

impl AgentsState {
    pub fn new(client: AgentClient) -> Self {
        Self {
            client,
            agents: Vec::new(),
            selected: None,
            core: StateCore::new(),
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Agent loaded by the last `fetch`.
    pub fn selected(&self) -> Option<&Agent> {
        self.selected.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.core.loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.core.error()
    }

    pub fn dismiss_error(&mut self) {
        self.core.dismiss_error();
    }

    pub fn requests_issued(&self) -> u64 {
        self.core.issued()
    }

    pub fn refresh(&mut self) {
        let client = self.client.clone();
        self.core
            .dispatch(async move { Ok(AgentsEvent::Listed(client.list_all().await)) });
    }

    pub fn fetch(&mut self, id: &str) {
        let client = self.client.clone();
        let id = id.to_string();
        self.core.dispatch(async move {
            let agent = client.get_by_id(&id).await;
            Ok(AgentsEvent::Fetched(id, agent))
        });
    }

    pub fn create(&mut self, draft: AgentDraft) {
        let client = self.client.clone();
        self.core
            .dispatch(async move { Ok(AgentsEvent::Created(client.create(draft).await)) });
    }

    pub fn edit(&mut self, id: &str, update: AgentUpdate) {
        let client = self.client.clone();
        let id = id.to_string();
        self.core.dispatch(async move {
            let agent = client.update(&id, update).await;
            Ok(AgentsEvent::Updated(id, agent))
        });
    }

    pub fn remove(&mut self, id: &str) {
        let client = self.client.clone();
        let id = id.to_string();
        self.core.dispatch(async move {
            let removed = client.delete_by_id(&id).await;
            Ok(AgentsEvent::Removed(id, removed))
        });
    }

    /// Applies every outcome that has arrived; returns the applied events.
    pub fn poll(&mut self) -> Vec<AgentsEvent> {
        let mut applied = Vec::new();
        while let Some(outcome) = self.core.try_next() {
            if let Some(event) = self.apply(outcome) {
                applied.push(event);
            }
        }
        applied
    }

    /// Waits for the latest request to finish and applies it.
    pub async fn settle(&mut self) -> Option<AgentsEvent> {
        let outcome = self.core.next().await?;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: Outcome<AgentsEvent>) -> Option<AgentsEvent> {
        let event = outcome.ok()?;
        match &event {
            AgentsEvent::Listed(agents) => {
                self.agents = agents.clone();
            }
            AgentsEvent::Fetched(id, agent) => {
                self.selected = agent.clone();
                if agent.is_none() {
                    self.core.set_error(format!("Agent {id} not found"));
                }
            }
            AgentsEvent::Created(agent) => {
                info!("agent {} created", agent.id);
                self.agents.push(agent.clone());
            }
            AgentsEvent::Updated(id, Some(agent)) => {
                if let Some(existing) = self.agents.iter_mut().find(|a| a.id == *id) {
                    *existing = agent.clone();
                } else {
                    self.agents.push(agent.clone());
                }
                if self.selected.as_ref().is_some_and(|a| a.id == *id) {
                    self.selected = Some(agent.clone());
                }
            }
            AgentsEvent::Updated(id, None) => {
                self.core.set_error(format!("Agent {id} not found"));
            }
            AgentsEvent::Removed(id, removed) => {
                self.agents.retain(|agent| agent.id != *id);
                if self.selected.as_ref().is_some_and(|a| a.id == *id) {
                    self.selected = None;
                }
                if !removed {
                    self.core.set_error(format!("Agent {id} not found"));
                }
            }
        }
        Some(event)
    }
}
