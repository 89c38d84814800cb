//! 遠端服務與直接生成端點的請求/回應結構。
//!
//! 遠端回應中的欄位全部視為可省略，轉換成本地型別時再補上預設值；
//! 只有識別碼是必要欄位。

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;
use crate::model::{
    Agent, AgentDraft, Character, DEFAULT_MODEL, DEFAULT_PROVIDER, DEFAULT_TEMPERATURE, Knowledge,
    KnowledgeDraft, KnowledgeKind, LlmSettings, Message, Role, new_id,
};

/// 解析 RFC 3339 字串或毫秒級 Unix 時間戳；無法辨識時回傳 `None`。
fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|ts| ts.with_timezone(&Utc)),
        Value::Number(number) => number
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

// --- 遠端代理服務 ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCharacter {
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub goals: Option<Vec<String>>,
    #[serde(default)]
    pub constraints: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLlm {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireKnowledge {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<KnowledgeKind>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<Value>,
}

impl WireKnowledge {
    /// 轉為本地型別。`agent_id` 一律以所屬代理為準。
    pub fn into_knowledge(self, agent_id: &str) -> Result<Knowledge, ClientError> {
        let id = self
            .id
            .ok_or_else(|| ClientError::MalformedBody("知識條目缺少 id".into()))?;
        Ok(Knowledge {
            id,
            agent_id: agent_id.to_string(),
            kind: self.kind.unwrap_or(KnowledgeKind::Text),
            content: self.content.unwrap_or_default(),
            filename: self.filename,
            file_type: self.file_type,
            created_at: parse_timestamp(self.created_at.as_ref()).unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAgent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub character: Option<WireCharacter>,
    #[serde(default)]
    pub llm: Option<WireLlm>,
    #[serde(default)]
    pub knowledge: Option<Vec<WireKnowledge>>,
    #[serde(default)]
    pub created_at: Option<Value>,
    #[serde(default)]
    pub updated_at: Option<Value>,
}

impl WireAgent {
    /// 轉為本地 `Agent`，並為缺漏欄位套用預設值。
    pub fn into_agent(self) -> Result<Agent, ClientError> {
        let id = self
            .id
            .ok_or_else(|| ClientError::MalformedBody("代理缺少 id".into()))?;
        let character = self.character.unwrap_or_default();
        let llm = self.llm.unwrap_or_default();
        let knowledge = self
            .knowledge
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.into_knowledge(&id))
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let created_at = parse_timestamp(self.created_at.as_ref()).unwrap_or(now);
        let updated_at = parse_timestamp(self.updated_at.as_ref())
            .unwrap_or(now)
            .max(created_at);

        Ok(Agent {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            character: Character {
                persona: character.persona.unwrap_or_default(),
                goals: character.goals.unwrap_or_default(),
                constraints: character.constraints.unwrap_or_default(),
            },
            llm: LlmSettings {
                provider: llm.provider.unwrap_or_else(|| DEFAULT_PROVIDER.into()),
                model: llm.model.unwrap_or_else(|| DEFAULT_MODEL.into()),
                temperature: llm.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            },
            knowledge,
            created_at,
            updated_at,
        })
    }
}

/// 將一組遠端代理轉換為本地型別，任一筆缺少 id 即視為整體格式錯誤。
pub fn into_agents(wire: Vec<WireAgent>) -> Result<Vec<Agent>, ClientError> {
    wire.into_iter().map(WireAgent::into_agent).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl WireMessage {
    /// 轉為本地訊息。`role` 缺漏時使用 `default_role`；`content` 為必要欄位。
    pub fn into_message(self, default_role: Role) -> Result<Message, ClientError> {
        let content = self
            .content
            .ok_or_else(|| ClientError::MalformedBody("訊息缺少 content".into()))?;
        Ok(Message {
            id: self.id.unwrap_or_else(|| new_id("msg")),
            role: self.role.unwrap_or(default_role),
            content,
            timestamp: parse_timestamp(self.timestamp.as_ref()).unwrap_or_else(Utc::now),
        })
    }
}

/// `POST /agents` 的請求內容。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPayload<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub character: &'a Character,
    pub llm: &'a LlmSettings,
    pub knowledge: &'a [KnowledgeDraft],
}

impl<'a> From<&'a AgentDraft> for AgentPayload<'a> {
    fn from(draft: &'a AgentDraft) -> Self {
        Self {
            name: &draft.name,
            description: &draft.description,
            character: &draft.character,
            llm: &draft.llm,
            knowledge: &draft.knowledge,
        }
    }
}

/// `POST /agents/{id}/chat` 的請求內容。
#[derive(Debug, Serialize)]
pub struct ChatPayload<'a> {
    pub message: &'a str,
}

/// `POST /rooms` 的請求內容。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload<'a> {
    pub name: &'a str,
    pub description: &'a str,
    /// 參與的代理 id。
    pub participants: &'a [String],
}

/// `POST /rooms/{id}/messages` 的請求內容。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessagePayload<'a> {
    pub content: &'a str,
    pub sender_id: &'a str,
}

// --- Gemini ---
#[derive(Debug, Serialize)]
pub struct GeminiPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct GeminiContent<'a> {
    pub role: &'a str,
    pub parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiPayload<'a> {
    pub contents: Vec<GeminiContent<'a>>,
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiPartOwned>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiPartOwned {
    pub text: Option<String>,
}

impl GeminiResponse {
    /// 第一個候選回應的第一段文字。
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn absent_fields_get_defaults() {
        let wire: WireAgent = serde_json::from_value(json!({ "id": "a1", "name": "Bot" })).unwrap();
        let agent = wire.into_agent().unwrap();
        assert_eq!(agent.llm, LlmSettings::default());
        assert_eq!(agent.description, "");
        assert_eq!(agent.character, Character::default());
        assert!(agent.knowledge.is_empty());
        assert!(agent.updated_at >= agent.created_at);
    }

    #[test]
    fn explicit_zero_temperature_is_kept() {
        let wire: WireAgent = serde_json::from_value(json!({
            "id": "a1",
            "llm": { "provider": "openai", "temperature": 0.0 }
        }))
        .unwrap();
        let agent = wire.into_agent().unwrap();
        assert_eq!(agent.llm.provider, "openai");
        assert_eq!(agent.llm.model, "gemini-pro");
        assert_eq!(agent.llm.temperature, 0.0);
    }

    #[test]
    fn knowledge_is_reowned_by_the_agent() {
        let wire: WireAgent = serde_json::from_value(json!({
            "id": "a1",
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": 1714557600000i64,
            "knowledge": [{ "id": "k1", "agentId": "other", "type": "url", "content": "https://x.org" }]
        }))
        .unwrap();
        let agent = wire.into_agent().unwrap();
        assert_eq!(agent.knowledge[0].agent_id, "a1");
        assert_eq!(agent.knowledge[0].kind, KnowledgeKind::Url);
        assert_eq!(agent.created_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn missing_id_is_malformed() {
        let wire: WireAgent = serde_json::from_value(json!({ "name": "Bot" })).unwrap();
        assert!(matches!(wire.into_agent(), Err(ClientError::MalformedBody(_))));
    }

    #[test]
    fn message_requires_content() {
        let reply: WireMessage =
            serde_json::from_value(json!({ "id": "m1", "content": "Hallo" })).unwrap();
        let message = reply.into_message(Role::Assistant).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.id, "m1");

        let empty: WireMessage = serde_json::from_value(json!({ "id": "m2" })).unwrap();
        assert!(empty.into_message(Role::Assistant).is_err());
    }

    #[test]
    fn room_payloads_match_the_service_keys() {
        let agents = vec!["a1".to_string(), "a2".to_string()];
        let room = RoomPayload {
            name: "Lobby",
            description: "",
            participants: &agents,
        };
        assert_eq!(
            serde_json::to_value(&room).unwrap(),
            json!({ "name": "Lobby", "description": "", "participants": ["a1", "a2"] })
        );
        let message = RoomMessagePayload {
            content: "Hallo",
            sender_id: "user",
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "content": "Hallo", "senderId": "user" })
        );
    }

    #[test]
    fn gemini_payload_uses_camel_case_config() {
        let payload = GeminiPayload {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: "hi" }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.5,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 1024,
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn gemini_first_text_handles_empty_candidates() {
        let empty: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_text(), None);
        let full: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Antwort" }] } }]
        }))
        .unwrap();
        assert_eq!(full.first_text().as_deref(), Some("Antwort"));
    }
}
