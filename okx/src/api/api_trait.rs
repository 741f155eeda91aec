use crate::client::OkxPublicClient;
use crate::error::Result;

/// API模块统一构造接口
pub trait OkxApiTrait: Sized {
    fn new(client: OkxPublicClient) -> Self;

    /// 从环境变量构建客户端
    fn from_env() -> Result<Self> {
        Ok(Self::new(OkxPublicClient::from_env()?))
    }
}
