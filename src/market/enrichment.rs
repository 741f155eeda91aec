//! 概览富化：恐惧贪婪指数与DeFi市值
//!
//! 尽力而为的旁路拉取。失败只记debug日志，字段留空，
//! 由快照的carry_forward沿用上一次的值。

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::app_config::env::{env_is_true, env_or_default};
use crate::market::types::MarketOverviewSnapshot;

const DEFAULT_FNG_URL: &str = "https://api.alternative.me/fng/";
const DEFAULT_DEFI_URL: &str =
    "https://api.coingecko.com/api/v3/global/decentralized_finance_defi";
const ENRICHMENT_TIMEOUT_SECS: u64 = 3;

#[derive(Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Deserialize)]
struct FngEntry {
    value: String,
}

#[derive(Deserialize)]
struct DefiResponse {
    data: DefiData,
}

#[derive(Deserialize)]
struct DefiData {
    defi_market_cap: String,
}

/// 富化数据拉取器
pub struct EnrichmentFetcher {
    client: Client,
    fng_url: String,
    defi_url: String,
}

impl EnrichmentFetcher {
    /// ENRICHMENT_ENABLED=false 时返回None，聚合周期跳过富化
    pub fn from_env() -> Option<Self> {
        if !env_is_true("ENRICHMENT_ENABLED", true) {
            return None;
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(ENRICHMENT_TIMEOUT_SECS))
            .build()
            .ok()?;
        Some(Self {
            client,
            fng_url: env_or_default("FEAR_GREED_URL", DEFAULT_FNG_URL),
            defi_url: env_or_default("DEFI_MARKET_CAP_URL", DEFAULT_DEFI_URL),
        })
    }

    /// 填充快照的富化字段，两个来源互不影响
    pub async fn apply(&self, snapshot: &mut MarketOverviewSnapshot) {
        match self.fetch_fear_greed().await {
            Some(v) => snapshot.fear_greed_value = Some(v),
            None => debug!("fear/greed 富化本轮缺席"),
        }
        match self.fetch_defi_market_cap().await {
            Some(v) => snapshot.defi_market_cap = Some(v),
            None => debug!("defi market cap 富化本轮缺席"),
        }
    }

    async fn fetch_fear_greed(&self) -> Option<f64> {
        let resp = self.client.get(&self.fng_url).send().await.ok()?;
        let body: FngResponse = serde_json::from_str(&resp.text().await.ok()?).ok()?;
        body.data.first()?.value.parse::<f64>().ok()
    }

    async fn fetch_defi_market_cap(&self) -> Option<f64> {
        let resp = self.client.get(&self.defi_url).send().await.ok()?;
        let body: DefiResponse = serde_json::from_str(&resp.text().await.ok()?).ok()?;
        body.data.defi_market_cap.parse::<f64>().ok()
    }
}
