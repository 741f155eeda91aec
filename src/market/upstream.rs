use async_trait::async_trait;
use thiserror::Error;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, error, warn};

use okx::api::api_trait::OkxApiTrait;
use okx::api::market::OkxMarket;
use okx::dto::market_dto::TickerOkxResDto;

use crate::market::compute;
use crate::market::types::{
    ConfluenceBreakdown, MarketOverviewSnapshot, MoversSnapshot, SignalsSnapshot, TickerRecord,
};

/// 瞬态失败的最大重试次数（不含首次请求）
const MAX_RETRIES: usize = 2;

/// 上游行情错误
///
/// 超时、限速等预期失败类在重试耗尽后统一归为Unavailable，
/// 由读取路径降级处理；只有配置错误向调用方硬失败。
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("上游行情不可用: {0}")]
    Unavailable(String),

    #[error("上游配置错误: {0}")]
    Config(String),
}

impl From<okx::error::Error> for UpstreamError {
    fn from(err: okx::error::Error) -> Self {
        match err {
            okx::error::Error::Config(msg) => UpstreamError::Config(msg),
            other => UpstreamError::Unavailable(other.to_string()),
        }
    }
}

/// 上游行情源
///
/// 聚合器只用fetch_tickers；读取路径的实时回退用各场景方法，
/// 口径与聚合器共用compute模块。
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// 拉取全市场行情快照
    async fn fetch_tickers(&self) -> Result<Vec<TickerRecord>, UpstreamError>;

    async fn fetch_overview(&self) -> Result<MarketOverviewSnapshot, UpstreamError> {
        let tickers = self.fetch_tickers().await?;
        Ok(compute::overview(&tickers))
    }

    async fn fetch_movers(&self, depth: usize) -> Result<MoversSnapshot, UpstreamError> {
        let tickers = self.fetch_tickers().await?;
        Ok(compute::movers(&tickers, depth))
    }

    async fn fetch_signals(&self, depth: usize) -> Result<SignalsSnapshot, UpstreamError> {
        let tickers = self.fetch_tickers().await?;
        Ok(compute::signals(&tickers, depth))
    }

    async fn fetch_confluence(&self, inst_id: &str) -> Result<ConfluenceBreakdown, UpstreamError> {
        let tickers = self.fetch_tickers().await?;
        let ticker = tickers
            .iter()
            .find(|t| t.inst_id == inst_id)
            .ok_or_else(|| UpstreamError::Unavailable(format!("未找到symbol: {}", inst_id)))?;
        Ok(compute::confluence(ticker))
    }
}

/// OKX上游行情源
///
/// SPOT与SWAP两次扫描合并；瞬态失败指数退避重试，配置错误不重试。
pub struct OkxUpstreamSource {
    market: OkxMarket,
    inst_types: Vec<String>,
}

impl OkxUpstreamSource {
    pub fn new(market: OkxMarket) -> Self {
        Self {
            market,
            inst_types: vec!["SPOT".to_string(), "SWAP".to_string()],
        }
    }

    pub fn from_env() -> Result<Self, UpstreamError> {
        Ok(Self::new(OkxMarket::from_env()?))
    }

    /// 单轮全市场扫描：任一产品类型成功即返回部分结果，全部失败才报错
    async fn sweep_once(&self) -> Result<Vec<TickerRecord>, okx::error::Error> {
        let mut records = Vec::new();
        let mut last_err: Option<okx::error::Error> = None;

        for inst_type in &self.inst_types {
            match self.market.get_tickers(inst_type).await {
                Ok(tickers) => {
                    debug!("Fetched {} {} tickers", tickers.len(), inst_type);
                    for t in tickers {
                        if let Some(record) = map_ticker(t) {
                            records.push(record);
                        }
                    }
                }
                Err(e) => {
                    error!("Failed to fetch {} tickers: {:?}", inst_type, e);
                    last_err = Some(e);
                }
            }
        }

        if records.is_empty() {
            if let Some(e) = last_err {
                return Err(e);
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl UpstreamSource for OkxUpstreamSource {
    async fn fetch_tickers(&self) -> Result<Vec<TickerRecord>, UpstreamError> {
        // 250ms / 500ms 两次退避重试，仅针对瞬态错误
        let strategy = ExponentialBackoff::from_millis(2).factor(125).take(MAX_RETRIES);

        let result = RetryIf::spawn(
            strategy,
            || self.sweep_once(),
            |e: &okx::error::Error| {
                let transient = e.is_transient();
                if transient {
                    warn!("上游瞬态失败，准备重试: {}", e);
                }
                transient
            },
        )
        .await;

        result.map_err(UpstreamError::from)
    }

    /// 单symbol用独立端点，避免整市场扫描
    async fn fetch_confluence(&self, inst_id: &str) -> Result<ConfluenceBreakdown, UpstreamError> {
        let ticker = self.market.get_ticker(inst_id).await?;
        let record = map_ticker(ticker)
            .ok_or_else(|| UpstreamError::Unavailable(format!("ticker数据不完整: {}", inst_id)))?;
        Ok(compute::confluence(&record))
    }
}

/// OKX Ticker转归一化记录，只保留USDT计价产品
///
/// OKX API defines:
/// SPOT: vol24h = Base Vol, volCcy24h = Quote Vol
/// SWAP/FUTURES: vol24h = Contract Vol, volCcy24h = Base Vol (Underlying)
fn map_ticker(t: TickerOkxResDto) -> Option<TickerRecord> {
    if !t.inst_id.contains("-USDT") {
        return None;
    }

    let last_price = t.last.parse::<f64>().unwrap_or(0.0);
    let open24h = t.open24h.parse::<f64>().unwrap_or(0.0);
    let change_pct_24h = if open24h > 0.0 {
        (last_price - open24h) / open24h * 100.0
    } else {
        0.0
    };

    let vol_ccy = t.vol_ccy24h.parse::<f64>().unwrap_or(0.0);
    let volume_24h = match t.inst_type.as_str() {
        "SPOT" => vol_ccy,
        "SWAP" | "FUTURES" => vol_ccy * last_price,
        _ => vol_ccy,
    };

    if last_price <= 0.0 {
        return None;
    }

    Some(TickerRecord {
        inst_id: t.inst_id,
        inst_type: t.inst_type,
        last_price,
        change_pct_24h,
        volume_24h,
        ts_ms: t.ts.parse::<i64>().unwrap_or(0),
    })
}
