//! 遠端客戶端與本地備援。
//!
//! 每個操作都先嘗試遠端服務；失敗時記錄 `warn!` 並改用共用的 `FallbackStore`。
//! 所有客戶端都持有同一個儲存區控制代碼，因此任何一條路徑寫入的資料彼此可見。

use std::future::Future;
use std::sync::Arc;

use log::warn;

use crate::config::{ClientMode, ConsoleConfig};
use crate::error::ClientError;
use crate::store::SharedStore;

pub mod agents;
pub mod chat;
pub mod generation;
pub mod knowledge;
pub mod remote;
pub mod rooms;
pub mod wire;

pub use agents::AgentClient;
pub use chat::ChatClient;
pub use generation::{GeminiGenerator, TextGenerator};
pub use knowledge::KnowledgeClient;
pub use remote::RemoteService;
pub use rooms::RoomClient;

/// 遠端傳輸層、備援儲存區與運作模式的組合，由各客戶端共用。
#[derive(Clone)]
pub struct Backend {
    remote: RemoteService,
    store: SharedStore,
    mode: ClientMode,
}

impl Backend {
    pub fn new(remote: RemoteService, store: SharedStore, mode: ClientMode) -> Self {
        Self {
            remote,
            store,
            mode,
        }
    }

    pub fn remote(&self) -> &RemoteService {
        &self.remote
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    /// 執行遠端呼叫。成功時回傳結果；失敗或處於 `MockOnly` 模式時回傳 `None`，
    /// 由呼叫端改走備援路徑。
    pub(crate) async fn try_remote<T, F>(&self, operation: &str, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if self.mode == ClientMode::MockOnly {
            return None;
        }
        match call.await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{operation}: 遠端呼叫失敗，改用本地備援 ({err})");
                None
            }
        }
    }
}

/// 所有客戶端的集合；共用同一個傳輸層與儲存區。
#[derive(Clone)]
pub struct Clients {
    pub agents: AgentClient,
    pub knowledge: KnowledgeClient,
    pub chat: ChatClient,
    pub rooms: RoomClient,
}

impl Clients {
    /// 以設定建立全部客戶端，直接生成使用 Gemini。
    pub fn from_config(config: &ConsoleConfig, store: SharedStore) -> Result<Self, ClientError> {
        let generator = GeminiGenerator::from_config(config)?;
        Self::with_generator(config, store, Arc::new(generator))
    }

    /// 以自訂的生成器建立全部客戶端。
    pub fn with_generator(
        config: &ConsoleConfig,
        store: SharedStore,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, ClientError> {
        let remote = RemoteService::new(config)?;
        let backend = Backend::new(remote.clone(), store, config.mode);
        let agents = AgentClient::new(backend.clone());
        let knowledge = KnowledgeClient::new(backend.clone(), agents.clone());
        let chat = ChatClient::new(backend, agents.clone(), generator, config.locale);
        let rooms = RoomClient::new(remote);
        Ok(Self {
            agents,
            knowledge,
            chat,
            rooms,
        })
    }

    pub fn mode(&self) -> ClientMode {
        self.agents.backend().mode()
    }
}
