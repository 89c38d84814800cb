//! 代理主控台的資料模型。
//!
//! 這裡只放純資料結構：代理 (`Agent`)、知識條目 (`Knowledge`)、對話訊息 (`Message`)，
//! 以及建立與更新時使用的草稿型別。序列化時一律使用 camelCase，與遠端服務的 JSON 相同。

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// 產生帶有前綴的唯一識別碼，例如 `agent-8f0c…`。
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// 代理的人設：角色描述、目標與限制。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub persona: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
}

/// 語言模型設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.into(),
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// 知識條目的種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeKind {
    Text,
    File,
    Url,
}

impl KnowledgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeKind::Text => "text",
            KnowledgeKind::File => "file",
            KnowledgeKind::Url => "url",
        }
    }
}

/// 附加在代理上的一筆知識。建立後除了刪除之外不可變更。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Knowledge {
    pub id: String,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: KnowledgeKind,
    /// 文字內容、URL，或檔案的（佔位）文字。
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 完整的代理紀錄。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    pub character: Character,
    pub llm: LlmSettings,
    #[serde(default)]
    pub knowledge: Vec<Knowledge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 尚未指派 id 與時間戳記的代理，用於建立。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    pub character: Character,
    pub llm: LlmSettings,
    #[serde(default)]
    pub knowledge: Vec<KnowledgeDraft>,
}

/// 尚未指派 id 的知識條目。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeDraft {
    #[serde(rename = "type")]
    pub kind: KnowledgeKind,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

impl KnowledgeDraft {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: KnowledgeKind::Text,
            content: content.into(),
            filename: None,
            file_type: None,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: KnowledgeKind::Url,
            content: url.into(),
            filename: None,
            file_type: None,
        }
    }

    /// 檔案型知識；`content` 是擷取出的文字或佔位文字。
    pub fn file(
        filename: impl Into<String>,
        file_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            kind: KnowledgeKind::File,
            content: content.into(),
            filename: Some(filename.into()),
            file_type: Some(file_type.into()),
        }
    }

    /// 以指定的代理 id 與目前時間具現化為 `Knowledge`。
    pub fn into_knowledge(self, agent_id: &str, created_at: DateTime<Utc>) -> Knowledge {
        Knowledge {
            id: new_id("knowledge"),
            agent_id: agent_id.to_string(),
            kind: self.kind,
            content: self.content,
            filename: self.filename,
            file_type: self.file_type,
            created_at,
        }
    }
}

/// 部分更新：每個欄位皆可省略，省略者保持原值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<Character>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmSettings>,
}

impl AgentUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.character.is_none()
            && self.llm.is_none()
    }

    /// 將有提供的欄位合併進既有代理。不會變更時間戳記。
    pub fn apply_to(&self, agent: &mut Agent) {
        if let Some(name) = &self.name {
            agent.name = name.clone();
        }
        if let Some(description) = &self.description {
            agent.description = description.clone();
        }
        if let Some(character) = &self.character {
            agent.character = character.clone();
        }
        if let Some(llm) = &self.llm {
            agent.llm = llm.clone();
        }
    }
}

impl From<AgentDraft> for AgentUpdate {
    /// 編輯表單送出時整份覆寫；知識條目另有專屬操作，因此不包含在內。
    fn from(draft: AgentDraft) -> Self {
        Self {
            name: Some(draft.name),
            description: Some(draft.description),
            character: Some(draft.character),
            llm: Some(draft.llm),
        }
    }
}

/// 對話訊息的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 測試對話中的一則訊息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: new_id("msg"),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// 使用者選擇上傳的檔案，已完整讀入記憶體。
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// 依副檔名推斷 MIME 類型；無法辨識時回傳 `application/octet-stream`。
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("txt") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("pdf") => "application/pdf",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
