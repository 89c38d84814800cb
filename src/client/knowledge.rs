use reqwest::multipart::{Form, Part};

use crate::error::ClientError;
use crate::model::{FileUpload, Knowledge, KnowledgeDraft, KnowledgeKind};

use super::agents::AgentClient;
use super::Backend;
use super::wire::WireKnowledge;

/// 檔案上傳失敗時的佔位內容。
pub fn file_placeholder(filename: &str) -> String {
    format!("Dateiinhalt von {filename}")
}

/// 知識條目的新增、查詢與刪除，與代理客戶端共用傳輸層及儲存區。
#[derive(Clone)]
pub struct KnowledgeClient {
    backend: Backend,
    agents: AgentClient,
}

impl KnowledgeClient {
    pub fn new(backend: Backend, agents: AgentClient) -> Self {
        Self { backend, agents }
    }

    /// 新增純文字知識。
    pub async fn add_text(&self, agent_id: &str, text: &str) -> Option<Knowledge> {
        self.agents
            .add_knowledge(agent_id, KnowledgeDraft::text(text))
            .await
    }

    /// 新增 URL 知識。
    pub async fn add_url(&self, agent_id: &str, url: &str) -> Option<Knowledge> {
        self.agents
            .add_knowledge(agent_id, KnowledgeDraft::url(url))
            .await
    }

    /// 以 multipart 表單上傳檔案；失敗時在本地建立帶有佔位內容的條目。
    pub async fn upload_file(&self, agent_id: &str, upload: FileUpload) -> Option<Knowledge> {
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/knowledge");
        let uploaded = self
            .backend
            .try_remote("上傳知識檔案", async {
                let form = build_upload_form(agent_id, &upload)?;
                let wire: WireKnowledge = remote.post_multipart(&path, form).await?;
                wire.into_knowledge(agent_id)
            })
            .await;
        match uploaded {
            Some(item) => Some(item),
            None => {
                let draft = KnowledgeDraft::file(
                    upload.filename.as_str(),
                    upload.mime_type.as_str(),
                    file_placeholder(&upload.filename),
                );
                self.backend.store().add_knowledge(agent_id, draft)
            }
        }
    }

    /// 取得單一知識條目。
    pub async fn get(&self, agent_id: &str, knowledge_id: &str) -> Option<Knowledge> {
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/knowledge/{knowledge_id}");
        let fetched = self
            .backend
            .try_remote("取得知識", async {
                let wire: WireKnowledge = remote.get(&path).await?;
                wire.into_knowledge(agent_id)
            })
            .await;
        match fetched {
            Some(item) => Some(item),
            None => self.backend.store().knowledge(agent_id, knowledge_id),
        }
    }

    /// 列出代理的所有知識條目；代理不存在時為空清單。
    pub async fn list(&self, agent_id: &str) -> Vec<Knowledge> {
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/knowledge");
        let listed = self
            .backend
            .try_remote("列出知識", async {
                let wire: Vec<WireKnowledge> = remote.get(&path).await?;
                wire.into_iter()
                    .map(|item| item.into_knowledge(agent_id))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await;
        match listed {
            Some(items) => items,
            None => self
                .backend
                .store()
                .list_knowledge(agent_id)
                .unwrap_or_default(),
        }
    }

    /// 刪除知識條目。
    pub async fn delete(&self, agent_id: &str, knowledge_id: &str) -> bool {
        self.agents.delete_knowledge(agent_id, knowledge_id).await
    }
}

fn build_upload_form(agent_id: &str, upload: &FileUpload) -> Result<Form, ClientError> {
    let part = Part::bytes(upload.bytes.clone())
        .file_name(upload.filename.clone())
        .mime_str(&upload.mime_type)?;
    Ok(Form::new()
        .part("file", part)
        .text("agentId", agent_id.to_string())
        .text("type", KnowledgeKind::File.as_str()))
}
