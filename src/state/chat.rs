use crate::client::ChatClient;
use crate::model::Message;

use super::{Outcome, StateCore};

/// Applied results of chat requests.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Loaded(Vec<Message>),
    Replied {
        pending_id: String,
        user: Message,
        reply: Message,
    },
    Cleared,
}

/// Transcript of the test chat with one agent.
pub struct ChatState {
    agent_id: String,
    client: ChatClient,
    messages: Vec<Message>,
    core: StateCore<ChatEvent>,
}

impl ChatState {
    pub fn new(client: ChatClient, agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            client,
            messages: Vec::new(),
            core: StateCore::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Messages in insertion order, including a pending optimistic one.
    pub fn messages(&self) -> &[Message] {
        &self.messages
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
            .dispatch(async move { Ok(ChatEvent::Loaded(client.history(&agent_id).await)) });
    }

    /// Shows the user message immediately and asks for a reply.
    ///
    /// Returns `false` without doing anything for blank input or while another
    /// request is in flight.
    pub fn send(&mut self, content: &str) -> bool {
        let content = content.trim();
        if content.is_empty() || self.core.loading() {
            return false;
        }
        let mut pending = Message::user(content);
        pending.id = format!("temp-{}", pending.id);
        let pending_id = pending.id.clone();
        self.messages.push(pending);

        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        let content = content.to_string();
        self.core.dispatch(async move {
            let user = Message::user(content.as_str());
            let reply = client.send(&agent_id, &content).await;
            Ok(ChatEvent::Replied {
                pending_id,
                user,
                reply,
            })
        });
        true
    }

    pub fn reset(&mut self) {
        let client = self.client.clone();
        let agent_id = self.agent_id.clone();
        self.core.dispatch(async move {
            client.clear(&agent_id).await;
            Ok(ChatEvent::Cleared)
        });
    }

    pub fn poll(&mut self) -> Vec<ChatEvent> {
        let mut applied = Vec::new();
        while let Some(outcome) = self.core.try_next() {
            if let Some(event) = self.apply(outcome) {
                applied.push(event);
            }
        }
        applied
    }

    pub async fn settle(&mut self) -> Option<ChatEvent> {
        let outcome = self.core.next().await?;
        self.apply(outcome)
    }

    fn apply(&mut self, outcome: Outcome<ChatEvent>) -> Option<ChatEvent> {
        let Ok(event) = outcome else {
            return None;
        };
        match &event {
            ChatEvent::Loaded(messages) => {
                self.messages = messages.clone();
            }
            ChatEvent::Replied {
                pending_id,
                user,
                reply,
            } => {
                self.messages.retain(|message| message.id != *pending_id);
                self.messages.push(user.clone());
                self.messages.push(reply.clone());
            }
            ChatEvent::Cleared => {
                self.messages.clear();
            }
        }
        Some(event)
    }
}
