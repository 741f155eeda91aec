use std::env;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://www.okx.com";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// OKX 公共响应信封
#[derive(Deserialize, Debug)]
pub struct OkxApiResponse<T> {
    pub code: String,
    pub msg: String,
    pub data: Option<T>,
}

/// 公共行情HTTP客户端（无签名）
#[derive(Clone)]
pub struct OkxPublicClient {
    client: Client,
    base_url: String,
}

impl OkxPublicClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("构建HTTP客户端失败: {}", e)))?;
        Ok(OkxPublicClient { client, base_url })
    }

    /// 从环境变量构建：OKX_BASE_URL / OKX_HTTP_TIMEOUT_SECS
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("OKX_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(Error::Config("OKX_BASE_URL 为空".to_string()));
        }
        let timeout_secs = env::var("OKX_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    /// 发送GET请求并解析OKX响应信封
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self.client.get(&url).query(query).send().await?;

        let status_code = response.status();
        let response_body = response.text().await?;
        debug!("path:{}, okx_response: {}", path, response_body);

        if status_code == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(format!("path: {}", path)));
        }
        if !status_code.is_success() {
            return Err(Error::Http(format!(
                "status: {}, path: {}",
                status_code, path
            )));
        }

        let envelope: OkxApiResponse<T> = serde_json::from_str(&response_body)?;
        if envelope.code != "0" {
            return Err(Error::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        envelope
            .data
            .ok_or_else(|| Error::Parse(format!("响应缺少data字段: {}", path)))
    }
}
