use crate::api::api_trait::OkxApiTrait;
use crate::client::OkxPublicClient;
use crate::dto::market_dto::TickerOkxResDto;
use crate::error::{Error, Result};

/// 行情数据API
#[derive(Clone)]
pub struct OkxMarket {
    client: OkxPublicClient,
}

impl OkxApiTrait for OkxMarket {
    fn new(client: OkxPublicClient) -> Self {
        OkxMarket { client }
    }
}

impl OkxMarket {
    /// 获取指定产品类型的全部Ticker
    /// inst_type: SPOT / SWAP / FUTURES
    pub async fn get_tickers(&self, inst_type: &str) -> Result<Vec<TickerOkxResDto>> {
        self.client
            .get("/api/v5/market/tickers", &[("instType", inst_type)])
            .await
    }

    /// 获取单个产品的Ticker
    pub async fn get_ticker(&self, inst_id: &str) -> Result<TickerOkxResDto> {
        let tickers: Vec<TickerOkxResDto> = self
            .client
            .get("/api/v5/market/ticker", &[("instId", inst_id)])
            .await?;
        tickers
            .into_iter()
            .next()
            .ok_or_else(|| Error::Parse(format!("ticker为空: {}", inst_id)))
    }
}
