use crate::model::{Agent, AgentDraft, AgentUpdate, Knowledge, KnowledgeDraft};

use super::Backend;
use super::wire::{AgentPayload, WireAgent, WireKnowledge, into_agents};

/// 代理 CRUD 與知識條目操作。所有操作都不會失敗；不存在以 `None`/`false` 表示。
#[derive(Clone)]
pub struct AgentClient {
    backend: Backend,
}

impl AgentClient {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    /// 建立代理。
    pub async fn create(&self, draft: AgentDraft) -> Agent {
        let remote = self.backend.remote();
        let created = self
            .backend
            .try_remote("建立代理", async {
                let wire: WireAgent = remote.post("/agents", &AgentPayload::from(&draft)).await?;
                wire.into_agent()
            })
            .await;
        match created {
            Some(agent) => agent,
            None => self.backend.store().insert_agent(draft),
        }
    }

    /// 列出所有代理。
    pub async fn list_all(&self) -> Vec<Agent> {
        let remote = self.backend.remote();
        let listed = self
            .backend
            .try_remote("列出代理", async {
                let wire: Vec<WireAgent> = remote.get("/agents").await?;
                into_agents(wire)
            })
            .await;
        match listed {
            Some(agents) => agents,
            None => self.backend.store().list_agents(),
        }
    }

    /// 依 id 取得代理。
    pub async fn get_by_id(&self, id: &str) -> Option<Agent> {
        let remote = self.backend.remote();
        let path = format!("/agents/{id}");
        let fetched = self
            .backend
            .try_remote("取得代理", async {
                let wire: WireAgent = remote.get(&path).await?;
                wire.into_agent()
            })
            .await;
        match fetched {
            Some(agent) => Some(agent),
            None => self.backend.store().agent(id),
        }
    }

    /// 部分更新代理。沒有任何欄位時不送出請求，直接回傳目前的代理。
    pub async fn update(&self, id: &str, update: AgentUpdate) -> Option<Agent> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }
        let remote = self.backend.remote();
        let path = format!("/agents/{id}");
        let updated = self
            .backend
            .try_remote("更新代理", async {
                let wire: WireAgent = remote.patch(&path, &update).await?;
                wire.into_agent()
            })
            .await;
        match updated {
            Some(agent) => Some(agent),
            None => self.backend.store().update_agent(id, &update),
        }
    }

    /// 刪除代理；找不到時回傳 `false`。
    pub async fn delete_by_id(&self, id: &str) -> bool {
        let remote = self.backend.remote();
        let path = format!("/agents/{id}");
        if self
            .backend
            .try_remote("刪除代理", remote.delete(&path))
            .await
            .is_some()
        {
            return true;
        }
        self.backend.store().remove_agent(id)
    }

    /// 以 JSON 新增知識條目。
    pub async fn add_knowledge(&self, agent_id: &str, draft: KnowledgeDraft) -> Option<Knowledge> {
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/knowledge");
        let added = self
            .backend
            .try_remote("新增知識", async {
                let wire: WireKnowledge = remote.post(&path, &draft).await?;
                wire.into_knowledge(agent_id)
            })
            .await;
        match added {
            Some(item) => Some(item),
            None => self.backend.store().add_knowledge(agent_id, draft),
        }
    }

    /// 刪除知識條目；找不到時回傳 `false`。
    pub async fn delete_knowledge(&self, agent_id: &str, knowledge_id: &str) -> bool {
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/knowledge/{knowledge_id}");
        if self
            .backend
            .try_remote("刪除知識", remote.delete(&path))
            .await
            .is_some()
        {
            return true;
        }
        self.backend.store().remove_knowledge(agent_id, knowledge_id)
    }
}
