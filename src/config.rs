//! 主控台設定。
//!
//! 設定來源依序為：內建預設值、TOML 設定檔（`--config`、`$AGENTDECK_CONFIG`
//! 或 `./config/agentdeck.toml`），最後由環境變數覆寫。

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::Locale;

pub const DEFAULT_API_URL: &str = "https://api.eliza.how";
pub const DEFAULT_GENERATION_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CONFIG_PATH: &str = "config/agentdeck.toml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("讀取設定檔失敗 {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析設定檔失敗 {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("寫入設定檔失敗 {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化設定失敗: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("環境變數 {name} 的值無效: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// 客戶端的運作模式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMode {
    /// 先呼叫遠端服務，失敗時改用本地儲存區。
    #[default]
    #[serde(rename = "remote")]
    RemoteWithFallback,
    /// 完全不連線，所有操作直接使用本地儲存區。
    #[serde(rename = "mock")]
    MockOnly,
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMode::RemoteWithFallback => f.write_str("remote"),
            ClientMode::MockOnly => f.write_str("mock"),
        }
    }
}

impl FromStr for ClientMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" | "remote-with-fallback" => Ok(ClientMode::RemoteWithFallback),
            "mock" | "mock-only" | "local" => Ok(ClientMode::MockOnly),
            other => Err(format!("未知的模式 '{other}'（可用值：remote、mock）")),
        }
    }
}

/// 主控台的完整設定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// 遠端代理服務的基礎 URL。
    pub api_url: String,
    /// 遠端服務的 Bearer 權杖。
    pub api_key: Option<String>,
    /// 直接生成端點的基礎 URL。
    pub generation_url: String,
    /// 直接生成使用的金鑰。
    pub generation_api_key: Option<String>,
    /// 允許顯示圖片的主機清單。
    pub image_hosts: Vec<String>,
    pub mode: ClientMode,
    pub locale: Locale,
    pub timeout_secs: u64,
    /// 紀錄檔目錄；未設定時使用設定檔所在目錄。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            api_key: None,
            generation_url: DEFAULT_GENERATION_URL.into(),
            generation_api_key: None,
            image_hosts: vec!["api.eliza.how".into()],
            mode: ClientMode::default(),
            locale: Locale::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_dir: None,
        }
    }
}

impl ConsoleConfig {
    /// 決定設定檔路徑：明確指定 > `$AGENTDECK_CONFIG` > 預設路徑。
    pub fn resolve_path<F>(explicit: Option<&Path>, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        lookup("AGENTDECK_CONFIG")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// 從指定檔案讀取設定；檔案不存在時回傳預設值。
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 讀取設定檔並套用目前行程的環境變數。
    pub fn load(explicit: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let lookup = |name: &str| env::var(name).ok();
        let path = Self::resolve_path(explicit, lookup);
        let mut config = Self::from_file(&path)?;
        config.apply_env(lookup)?;
        Ok((config, path))
    }

    /// 以查詢函式覆寫設定，方便測試時不必修改行程環境。
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = get("AGENTDECK_API_URL") {
            self.api_url = url;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.generation_api_key = Some(key);
        }
        if let Some(key) = get("AGENTDECK_API_KEY") {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = self.generation_api_key.clone();
        }
        if let Some(url) = get("AGENTDECK_GENERATION_URL") {
            self.generation_url = url;
        }
        if let Some(hosts) = get("AGENTDECK_IMAGE_HOSTS") {
            self.image_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(mode) = get("AGENTDECK_MODE") {
            self.mode = mode.parse().map_err(|reason| ConfigError::InvalidEnv {
                name: "AGENTDECK_MODE",
                reason,
            })?;
        }
        if let Some(lang) = get("AGENTDECK_LANG") {
            self.locale = lang.parse().map_err(|reason| ConfigError::InvalidEnv {
                name: "AGENTDECK_LANG",
                reason,
            })?;
        }
        if let Some(timeout) = get("AGENTDECK_TIMEOUT_SECS") {
            self.timeout_secs =
                timeout
                    .trim()
                    .parse()
                    .map_err(|err: std::num::ParseIntError| ConfigError::InvalidEnv {
                        name: "AGENTDECK_TIMEOUT_SECS",
                        reason: err.to_string(),
                    })?;
        }
        Ok(())
    }

    /// 將目前設定以易讀的 TOML 格式寫回檔案，必要時建立上層目錄。
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(self)?;
        fs::write(path, serialized).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 紀錄檔目錄；預設為設定檔所在目錄。
    pub fn log_dir_for(&self, config_path: &Path) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }
        match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// 判斷 URL 的主機是否在圖片允許清單內。
    pub fn is_allowed_image_host(&self, url: &str) -> bool {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.image_hosts
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }
}
