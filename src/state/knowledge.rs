use crate::client::KnowledgeClient;
use crate::forms::{KnowledgeInputError, validate_text, validate_upload, validate_url};
use crate::model::{FileUpload, Knowledge};

use super::{Outcome, StateCore};

/// Applied results of knowledge requests.
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeEvent {
    Loaded(Vec<Knowledge>),
    Added(Knowledge),
    Removed(String),
}

/// Knowledge items of one agent.
pub struct KnowledgeState {
    agent_id: String,
    client: KnowledgeClient,
    items: Vec<Knowledge>,
    core: StateCore<KnowledgeEvent>,
}

impl KnowledgeState {
    pub fn new(client: KnowledgeClient, agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            client,
            items: Vec::new(),
            core: StateCore::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn items(&self) -> &[Knowledge] {
        &self.items
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
        let agent_id = self.agent_id.clone();
        self.core
            .dispatch(async move { Ok(KnowledgeEvent::Loaded(client.list(&agent_id).await)) });
    }

    pub fn add_text(&mut self, text: &str) -> Result<(), KnowledgeInputError> {
        let text = validate_text(text)?.to_string();
        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        self.core.dispatch(async move {
            added(&agent_id, client.add_text(&agent_id, &text).await)
        });
        Ok(())
    }

    pub fn add_url(&mut self, url: &str) -> Result<(), KnowledgeInputError> {
        let url = validate_url(url)?.to_string();
        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        self.core.dispatch(async move {
            added(&agent_id, client.add_url(&agent_id, &url).await)
        });
        Ok(())
    }

    /// Uploads a file. Rejected files never reach the client.
    pub fn upload_file(&mut self, upload: FileUpload) -> Result<(), KnowledgeInputError> {
        validate_upload(&upload)?;
        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        self.core.dispatch(async move {
            added(&agent_id, client.upload_file(&agent_id, upload).await)
        });
        Ok(())
    }

    pub fn remove(&mut self, knowledge_id: &str) {
        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        let knowledge_id = knowledge_id.to_string();
        self.core.dispatch(async move {
            if client.delete(&agent_id, &knowledge_id).await {
                Ok(KnowledgeEvent::Removed(knowledge_id))
            } else {
                Err(format!("Knowledge item {knowledge_id} not found"))
            }
        });
    }

    pub fn poll(&mut self) -> Vec<KnowledgeEvent> {
        let mut applied = Vec::new();
        while let Some(outcome) = self.core.try_next() {
            if let Some(event) = self.apply(outcome) {
                applied.push(event);
            }
        }
        applied
    }

    pub async fn settle(&mut self) -> Option<KnowledgeEvent> {
        let outcome = self.core.next().await?;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: Outcome<KnowledgeEvent>) -> Option<KnowledgeEvent> {
        let event = outcome.ok()?;
        match &event {
            KnowledgeEvent::Loaded(items) => self.items = items.clone(),
            KnowledgeEvent::Added(item) => self.items.push(item.clone()),
            KnowledgeEvent::Removed(id) => self.items.retain(|item| item.id != *id),
        }
        Some(event)
    }
}

fn added(agent_id: &str, item: Option<Knowledge>) -> Outcome<KnowledgeEvent> {
    item.map(KnowledgeEvent::Added)
        .ok_or_else(|| format!("Agent {agent_id} not found"))
}
