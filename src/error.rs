use reqwest::StatusCode;
use thiserror::Error;

/// 遠端客戶端與直接生成路徑的錯誤分類。
///
/// `Http`、`Status`、`Decode` 與 `MalformedBody` 代表遠端服務不可用，
/// 客戶端會在內部攔截並改走本地備援；它們不會穿出公開 API。
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP 請求失敗: {0}")]
    Http(#[from] reqwest::Error),
    #[error("遠端服務回應 {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("無法解析回應內容: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("回應內容不完整: {0}")]
    MalformedBody(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Generation(String),
    #[error("設定錯誤: {0}")]
    Config(String),
}

impl ClientError {
    /// 是否屬於「遠端不可用」類別，也就是應該退回本地備援的錯誤。
    pub fn is_remote_unavailable(&self) -> bool {
        matches!(
            self,
            ClientError::Http(_)
                | ClientError::Status { .. }
                | ClientError::Decode(_)
                | ClientError::MalformedBody(_)
        )
    }
}

impl From<reqwest::header::InvalidHeaderValue> for ClientError {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        ClientError::Config(format!("無效的標頭值: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_count_as_remote_unavailable() {
        let err = ClientError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "boom".into(),
        };
        assert!(err.is_remote_unavailable());
        assert!(!ClientError::Generation("x".into()).is_remote_unavailable());
    }

    #[test]
    fn generation_error_displays_bare_reason() {
        let err = ClientError::Generation("Gemini API key not found".into());
        assert_eq!(err.to_string(), "Gemini API key not found");
    }
}
