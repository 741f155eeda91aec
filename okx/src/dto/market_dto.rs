use serde::{Deserialize, Serialize};

/// Ticker行情数据
///
/// OKX API defines:
/// SPOT: vol24h = Base Vol, volCcy24h = Quote Vol
/// SWAP/FUTURES: vol24h = Contract Vol, volCcy24h = Base Vol (Underlying)
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TickerOkxResDto {
    pub inst_type: String,
    pub inst_id: String,
    /// 最新成交价
    pub last: String,
    /// 24小时开盘价
    pub open24h: String,
    /// 24小时最高价
    pub high24h: String,
    /// 24小时最低价
    pub low24h: String,
    /// 24小时成交量（计价货币）
    pub vol_ccy24h: String,
    /// 24小时成交量（交易货币/合约张数）
    pub vol24h: String,
    /// 数据产生时间，Unix时间戳毫秒
    pub ts: String,
}
