//! 直接生成備援：遠端聊天端點失敗時，自行組出提示詞並呼叫 Gemini 的
//! `generateContent` 端點。

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use super::wire::{GeminiContent, GeminiGenerationConfig, GeminiPart, GeminiPayload, GeminiResponse};
use crate::config::ConsoleConfig;
use crate::error::ClientError;
use crate::model::{Agent, KnowledgeKind, LlmSettings, Message, Role};

const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// 文字生成後端的抽象，讓測試能替換成固定回覆的實作。
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// 以指定的模型設定為 `text` 產生回覆。
    async fn generate(&self, text: &str, llm: &LlmSettings) -> Result<String, ClientError>;
}

/// 呼叫 Gemini `generateContent` 端點的生成器。
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ClientError> {
        Self::new(
            config.generation_url.clone(),
            config.generation_api_key.clone(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )
    }

    fn endpoint(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, api_key
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, text: &str, llm: &LlmSettings) -> Result<String, ClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ClientError::Generation("Gemini API key not found".into()))?;

        let payload = GeminiPayload {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: llm.temperature,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!("Gemini generateContent, model {}", llm.model);
        let response = self
            .client
            .post(self.endpoint(&llm.model, api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|err| ClientError::Generation(format!("Gemini API 呼叫失敗: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Generation(format!(
                "Gemini API error: {status} {body}"
            )));
        }

        let data: GeminiResponse = response
            .json()
            .await
            .map_err(|err| ClientError::Generation(format!("解析 Gemini 回應失敗: {err}")))?;
        data.first_text()
            .ok_or_else(|| ClientError::Generation("Gemini 回應未包含文字".into()))
    }
}

/// 依代理設定與先前的對話紀錄組出提示詞。
///
/// 包含人設、以 `- ` 條列的目標與限制、知識（若有）以及 `User:`/`Assistant:`
/// 格式的對話歷史。
pub fn build_prompt(agent: &Agent, history: &[Message]) -> String {
    let goals = bullet_list(&agent.character.goals);
    let constraints = bullet_list(&agent.character.constraints);

    let knowledge = agent
        .knowledge
        .iter()
        .map(|item| match item.kind {
            KnowledgeKind::Text => item.content.clone(),
            KnowledgeKind::Url => format!("Information from URL: {}", item.content),
            KnowledgeKind::File => format!(
                "Information from file {}: {}",
                item.filename.as_deref().unwrap_or_default(),
                item.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let conversation = history
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{speaker}: {}", message.content)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = format!(
        "You are acting as an AI agent with the following characteristics:\n\nPERSONA:\n{}\n\nGOALS:\n{}\n\nCONSTRAINTS:\n{}",
        agent.character.persona, goals, constraints
    );
    if !knowledge.is_empty() {
        prompt.push_str("\n\nKNOWLEDGE:\n");
        prompt.push_str(&knowledge);
    }
    prompt.push_str("\n\nCONVERSATION HISTORY:\n");
    prompt.push_str(&conversation);
    prompt
}

/// 提示詞之後接上本次使用者訊息，組成送往模型的完整文字。
pub fn compose_request_text(prompt: &str, user_message: &str) -> String {
    format!("{prompt}\n\nUser: {user_message}\n\nAssistant:")
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Character, Knowledge};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn agent_with_knowledge(knowledge: Vec<Knowledge>) -> Agent {
        let now = Utc::now();
        Agent {
            id: "a1".into(),
            name: "Bot".into(),
            description: "Ein Testagent".into(),
            character: Character {
                persona: "Du bist hilfsbereit.".into(),
                goals: vec!["Fragen beantworten".into(), "Helfen".into()],
                constraints: vec!["Höflich bleiben".into()],
            },
            llm: LlmSettings::default(),
            knowledge,
            created_at: now,
            updated_at: now,
        }
    }

    fn knowledge(kind: KnowledgeKind, content: &str, filename: Option<&str>) -> Knowledge {
        Knowledge {
            id: "k".into(),
            agent_id: "a1".into(),
            kind,
            content: content.into(),
            filename: filename.map(String::from),
            file_type: filename.map(|_| "text/plain".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_lists_goals_and_constraints_as_bullets() {
        let prompt = build_prompt(&agent_with_knowledge(vec![]), &[]);
        assert!(prompt.starts_with(
            "You are acting as an AI agent with the following characteristics:\n\nPERSONA:\nDu bist hilfsbereit."
        ));
        assert!(prompt.contains("GOALS:\n- Fragen beantworten\n- Helfen"));
        assert!(prompt.contains("CONSTRAINTS:\n- Höflich bleiben"));
        assert!(!prompt.contains("KNOWLEDGE:"));
        assert!(prompt.ends_with("CONVERSATION HISTORY:\n"));
    }

    #[test]
    fn prompt_flattens_knowledge_by_kind() {
        let agent = agent_with_knowledge(vec![
            knowledge(KnowledgeKind::Text, "Öffnungszeiten 9-17", None),
            knowledge(KnowledgeKind::Url, "https://example.org", None),
            knowledge(KnowledgeKind::File, "Inhalt", Some("faq.txt")),
        ]);
        let prompt = build_prompt(&agent, &[]);
        assert!(prompt.contains(
            "KNOWLEDGE:\nÖffnungszeiten 9-17\n\nInformation from URL: https://example.org\n\nInformation from file faq.txt: Inhalt"
        ));
    }

    #[test]
    fn history_and_request_text_use_speaker_labels() {
        let history = vec![Message::user("Hallo"), Message::assistant("Hi!")];
        let prompt = build_prompt(&agent_with_knowledge(vec![]), &history);
        assert!(prompt.ends_with("CONVERSATION HISTORY:\nUser: Hallo\nAssistant: Hi!"));
        let text = compose_request_text("P", "Wie geht's?");
        assert_eq!(text, "P\n\nUser: Wie geht's?\n\nAssistant:");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let generator =
            GeminiGenerator::new("http://127.0.0.1:1", None, Duration::from_secs(1)).unwrap();
        let err = generator
            .generate("hi", &LlmSettings::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Gemini API key not found");
    }

    #[test]
    fn endpoint_embeds_model_and_key() {
        let generator = GeminiGenerator::new(
            "https://generativelanguage.googleapis.com/",
            Some("k".into()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            generator.endpoint("gemini-pro", "k"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent?key=k"
        );
    }
}
