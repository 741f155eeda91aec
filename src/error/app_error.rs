use thiserror::Error;

/// 应用错误
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 缓存错误
    #[error("缓存错误: {0}")]
    CacheError(String),

    /// 上游行情错误
    #[error("上游行情错误: {0}")]
    UpstreamError(String),

    /// 未知错误
    #[error("未知错误: {0}")]
    Unknown(String),
}

/// 把okx的错误转换为AppError
impl From<okx::error::Error> for AppError {
    fn from(err: okx::error::Error) -> Self {
        match err {
            okx::error::Error::Config(msg) => AppError::ConfigError(msg),
            other => AppError::UpstreamError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Unknown(err.to_string())
    }
}
