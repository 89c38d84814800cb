use serde_json::Value;

use crate::error::ClientError;

use super::remote::RemoteService;
use super::wire::{RoomMessagePayload, RoomPayload};

/// 聊天室端點的直通呼叫。沒有本地備援，錯誤直接回傳給呼叫端。
#[derive(Clone)]
pub struct RoomClient {
    remote: RemoteService,
}

impl RoomClient {
    pub fn new(remote: RemoteService) -> Self {
        Self { remote }
    }

    pub async fn create_room(
        &self,
        name: &str,
        description: &str,
        agent_ids: &[String],
    ) -> Result<Value, ClientError> {
        let payload = RoomPayload {
            name,
            description,
            participants: agent_ids,
        };
        self.remote.post("/rooms", &payload).await
    }

    pub async fn send_room_message(
        &self,
        room_id: &str,
        content: &str,
        sender_id: &str,
    ) -> Result<Value, ClientError> {
        let payload = RoomMessagePayload { content, sender_id };
        self.remote
            .post(&format!("/rooms/{room_id}/messages"), &payload)
            .await
    }

    pub async fn room_messages(&self, room_id: &str) -> Result<Value, ClientError> {
        self.remote.get(&format!("/rooms/{room_id}/messages")).await
    }
}
