use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// OKX 客户端错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 请求超时
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 触发限速 (HTTP 429)
    #[error("触发限速: {0}")]
    RateLimited(String),

    /// 其他HTTP错误
    #[error("HTTP错误: {0}")]
    Http(String),

    /// OKX业务错误码 (code != 0)
    #[error("OKX API错误 code={code}: {msg}")]
    Api { code: String, msg: String },

    /// 响应解析失败
    #[error("响应解析失败: {0}")]
    Parse(String),

    /// 配置错误（基础URL、超时配置等），不可重试
    #[error("配置错误: {0}")]
    Config(String),
}

impl Error {
    /// 是否为瞬态错误（可重试）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::RateLimited(_) | Error::Http(_) | Error::Api { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else {
            Error::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
