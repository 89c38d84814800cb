//! 遠端代理服務的 HTTP 傳輸層。
//!
//! 這一層只負責送出請求、檢查狀態碼與解析 JSON；是否退回本地備援由上層決定。

use std::time::Duration;

use log::debug;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ConsoleConfig;
use crate::error::ClientError;

/// 與遠端服務溝通的客戶端。內部的 `reqwest::Client` 可以低成本複製。
#[derive(Clone, Debug)]
pub struct RemoteService {
    client: Client,
    base_url: String,
}

impl RemoteService {
    /// 根據設定建立傳輸層；若設定了權杖，每個請求都會帶上 Bearer 標頭。
    pub fn new(config: &ConsoleConfig) -> Result<Self, ClientError> {
        let base_url = config.api_url.trim().trim_end_matches('/').to_string();
        if reqwest::Url::parse(&base_url).is_err() {
            return Err(ClientError::Config(format!("無效的 API 位址: {}", config.api_url)));
        }
        let client = Client::builder()
            .default_headers(build_headers(config.api_key.as_deref())?)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(self.client.get(self.url(path)), "GET", path)
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.client.post(self.url(path)).json(body), "POST", path)
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.client.patch(self.url(path)).json(body), "PATCH", path)
            .await
    }

    /// 以 multipart 表單送出，用於檔案上傳。
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ClientError> {
        self.execute(self.client.post(self.url(path)).multipart(form), "POST", path)
            .await
    }

    /// 刪除資源；回應內容會被忽略，只檢查狀態碼。
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        debug!("DELETE {}{}", self.base_url, path);
        let response = self.client.delete(self.url(path)).send().await?;
        ensure_success(response).await.map(|_| ())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<T, ClientError> {
        debug!("{method} {}{}", self.base_url, path);
        let response = request.send().await?;
        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// 非 2xx 狀態碼一律轉為 `ClientError::Status`，並保留回應內容供紀錄使用。
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

/// 建構預設標頭。
fn build_headers(api_key: Option<&str>) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(api_key) = api_key.map(str::trim)
        && !api_key.is_empty()
    {
        let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}
