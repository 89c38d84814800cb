//! 本地備援儲存區。
//!
//! 遠端服務無法使用時，所有代理、知識與對話紀錄都改存於此。儲存區由呼叫端
//! 明確建立並以 `Arc` 共享給各個客戶端，不存在任何全域狀態。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::model::{
    Agent, AgentDraft, AgentUpdate, Knowledge, KnowledgeDraft, Message, new_id,
};

/// 備援儲存區的操作介面。所有操作皆為短暫的同步臨界區段，不會失敗；
/// 不存在的目標以 `None` 或 `false` 表示。
pub trait FallbackStore: Send + Sync {
    fn list_agents(&self) -> Vec<Agent>;
    fn agent(&self, id: &str) -> Option<Agent>;
    /// 以新的 id 與相同的建立/更新時間寫入草稿。知識清單一律從空白開始。
    fn insert_agent(&self, draft: AgentDraft) -> Agent;
    fn update_agent(&self, id: &str, update: &AgentUpdate) -> Option<Agent>;
    fn remove_agent(&self, id: &str) -> bool;

    fn list_knowledge(&self, agent_id: &str) -> Option<Vec<Knowledge>>;
    fn knowledge(&self, agent_id: &str, knowledge_id: &str) -> Option<Knowledge>;
    fn add_knowledge(&self, agent_id: &str, draft: KnowledgeDraft) -> Option<Knowledge>;
    fn remove_knowledge(&self, agent_id: &str, knowledge_id: &str) -> bool;

    fn transcript(&self, agent_id: &str) -> Vec<Message>;
    fn append_messages(&self, agent_id: &str, messages: &[Message]);
    fn clear_transcript(&self, agent_id: &str);

    /// 遠端清除失敗時設定；設定期間對話紀錄只以本地為準。
    fn set_pending_clear(&self, agent_id: &str, pending: bool);
    fn pending_clear(&self, agent_id: &str) -> bool;
}

/// 所有客戶端共用的儲存區控制代碼。
pub type SharedStore = Arc<dyn FallbackStore>;

#[derive(Default)]
struct StoreInner {
    agents: Vec<Agent>,
    transcripts: HashMap<String, Vec<Message>>,
    pending_clears: HashSet<String>,
}

/// 以 `parking_lot::Mutex` 保護的記憶體儲存區。
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 建立一個可直接交給 `Clients` 的共享控制代碼。
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

/// 回傳嚴格晚於 `previous` 的時間戳記，即使時鐘解析度不足或被回撥。
pub(crate) fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

impl StoreInner {
    fn agent_mut(&mut self, id: &str) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }
}

impl FallbackStore for MemoryStore {
    fn list_agents(&self) -> Vec<Agent> {
        self.inner.lock().agents.clone()
    }

    fn agent(&self, id: &str) -> Option<Agent> {
        self.inner
            .lock()
            .agents
            .iter()
            .find(|agent| agent.id == id)
            .cloned()
    }

    fn insert_agent(&self, draft: AgentDraft) -> Agent {
        let now = Utc::now();
        let agent = Agent {
            id: new_id("agent"),
            name: draft.name,
            description: draft.description,
            character: draft.character,
            llm: draft.llm,
            knowledge: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.inner.lock().agents.push(agent.clone());
        agent
    }

    fn update_agent(&self, id: &str, update: &AgentUpdate) -> Option<Agent> {
        let mut inner = self.inner.lock();
        let agent = inner.agent_mut(id)?;
        update.apply_to(agent);
        agent.updated_at = next_timestamp(agent.updated_at);
        Some(agent.clone())
    }

    fn remove_agent(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.agents.len();
        inner.agents.retain(|agent| agent.id != id);
        inner.agents.len() != before
    }

    fn list_knowledge(&self, agent_id: &str) -> Option<Vec<Knowledge>> {
        self.agent(agent_id).map(|agent| agent.knowledge)
    }

    fn knowledge(&self, agent_id: &str, knowledge_id: &str) -> Option<Knowledge> {
        self.inner
            .lock()
            .agents
            .iter()
            .find(|agent| agent.id == agent_id)?
            .knowledge
            .iter()
            .find(|item| item.id == knowledge_id)
            .cloned()
    }

    fn add_knowledge(&self, agent_id: &str, draft: KnowledgeDraft) -> Option<Knowledge> {
        let mut inner = self.inner.lock();
        let agent = inner.agent_mut(agent_id)?;
        let updated_at = next_timestamp(agent.updated_at);
        let item = draft.into_knowledge(&agent.id, updated_at);
        agent.knowledge.push(item.clone());
        agent.updated_at = updated_at;
        Some(item)
    }

    fn remove_knowledge(&self, agent_id: &str, knowledge_id: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(agent) = inner.agent_mut(agent_id) else {
            return false;
        };
        let before = agent.knowledge.len();
        agent.knowledge.retain(|item| item.id != knowledge_id);
        if agent.knowledge.len() == before {
            return false;
        }
        agent.updated_at = next_timestamp(agent.updated_at);
        true
    }

    fn transcript(&self, agent_id: &str) -> Vec<Message> {
        self.inner
            .lock()
            .transcripts
            .get(agent_id)
            .cloned()
            .unwrap_or_default()
    }

    fn append_messages(&self, agent_id: &str, messages: &[Message]) {
        self.inner
            .lock()
            .transcripts
            .entry(agent_id.to_string())
            .or_default()
            .extend_from_slice(messages);
    }

    fn clear_transcript(&self, agent_id: &str) {
        self.inner.lock().transcripts.remove(agent_id);
    }

    fn set_pending_clear(&self, agent_id: &str, pending: bool) {
        let mut inner = self.inner.lock();
        if pending {
            inner.pending_clears.insert(agent_id.to_string());
        } else {
            inner.pending_clears.remove(agent_id);
        }
    }

    fn pending_clear(&self, agent_id: &str) -> bool {
        self.inner.lock().pending_clears.contains(agent_id)
    }
}
