use std::sync::Arc;

use log::{info, warn};

use crate::error::ClientError;
use crate::i18n::Locale;
use crate::model::{Message, Role};

use super::agents::AgentClient;
use super::generation::{TextGenerator, build_prompt, compose_request_text};
use super::Backend;
use super::wire::{ChatPayload, WireMessage};

/// 測試對話客戶端。
///
/// 主要路徑把訊息交給遠端服務；失敗時改以代理設定自行組出提示詞並直接呼叫生成端點。
/// 兩條路徑都會把訊息寫入本地對話紀錄。
#[derive(Clone)]
pub struct ChatClient {
    backend: Backend,
    agents: AgentClient,
    generator: Arc<dyn TextGenerator>,
    locale: Locale,
}

impl ChatClient {
    pub fn new(
        backend: Backend,
        agents: AgentClient,
        generator: Arc<dyn TextGenerator>,
        locale: Locale,
    ) -> Self {
        Self {
            backend,
            agents,
            generator,
            locale,
        }
    }

    /// 傳送訊息並取得助理回覆。此操作不會失敗，最差情況回傳道歉訊息。
    pub async fn send(&self, agent_id: &str, content: &str) -> Message {
        self.retry_pending_clear(agent_id).await;
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/chat");
        let replied = self
            .backend
            .try_remote("傳送聊天訊息", async {
                let wire: WireMessage = remote.post(&path, &ChatPayload { message: content }).await?;
                wire.into_message(Role::Assistant)
            })
            .await;

        if let Some(reply) = replied {
            self.backend
                .store()
                .append_messages(agent_id, &[Message::user(content), reply.clone()]);
            return reply;
        }
        self.send_with_generation(agent_id, content).await
    }

    /// 備援路徑：查詢代理設定、組出提示詞並直接生成。
    async fn send_with_generation(&self, agent_id: &str, content: &str) -> Message {
        let Some(agent) = self.agents.get_by_id(agent_id).await else {
            let err = ClientError::NotFound(format!("Agent with ID {agent_id} not found"));
            warn!("直接生成失敗: {err}");
            return Message::assistant(self.locale.strings().generation_apology(&err.to_string()));
        };

        let store = self.backend.store();
        let prior = store.transcript(agent_id);
        store.append_messages(agent_id, &[Message::user(content)]);

        let prompt = build_prompt(&agent, &prior);
        let request_text = compose_request_text(&prompt, content);
        let reply = match self.generator.generate(&request_text, &agent.llm).await {
            Ok(text) => {
                info!("{} 已為代理 {agent_id} 生成回覆", self.generator.name());
                Message::assistant(text)
            }
            Err(err) => {
                warn!("{} 生成失敗: {err}", self.generator.name());
                Message::assistant(self.locale.strings().generation_apology(&err.to_string()))
            }
        };
        store.append_messages(agent_id, &[reply.clone()]);
        reply
    }

    /// 取得對話紀錄；遠端失敗，或先前的遠端清除尚未成功時，使用本地紀錄。
    pub async fn history(&self, agent_id: &str) -> Vec<Message> {
        if !self.retry_pending_clear(agent_id).await {
            return self.backend.store().transcript(agent_id);
        }
        let remote = self.backend.remote();
        let path = format!("/agents/{agent_id}/chat/history");
        let fetched = self
            .backend
            .try_remote("取得對話紀錄", async {
                let wire: Vec<WireMessage> = remote.get(&path).await?;
                wire.into_iter()
                    .map(|message| message.into_message(Role::Assistant))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await;
        match fetched {
            Some(messages) => messages,
            None => self.backend.store().transcript(agent_id),
        }
    }

    /// 清除對話紀錄。無論遠端是否成功，本地紀錄一律清空並回傳 `true`。
    ///
    /// 遠端清除失敗時會留下標記，之後的 `history` 只讀本地紀錄，直到重試成功。
    pub async fn clear(&self, agent_id: &str) -> bool {
        let store = self.backend.store();
        let cleared = self.delete_remote_history(agent_id, "清除對話紀錄").await;
        store.clear_transcript(agent_id);
        store.set_pending_clear(agent_id, !cleared);
        true
    }

    /// 重試先前失敗的遠端清除。回傳遠端紀錄此刻是否可信。
    async fn retry_pending_clear(&self, agent_id: &str) -> bool {
        let store = self.backend.store();
        if !store.pending_clear(agent_id) {
            return true;
        }
        if self.delete_remote_history(agent_id, "重試清除對話紀錄").await {
            store.set_pending_clear(agent_id, false);
            return true;
        }
        false
    }

    async fn delete_remote_history(&self, agent_id: &str, operation: &str) -> bool {
        let path = format!("/agents/{agent_id}/chat/history");
        self.backend
            .try_remote(operation, self.backend.remote().delete(&path))
            .await
            .is_some()
    }
}
