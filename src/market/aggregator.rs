use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::app_config::env::{env_csv, env_u64};
use crate::cache::{ContentQuality, TierStore};
use crate::market::compute;
use crate::market::enrichment::EnrichmentFetcher;
use crate::market::keys;
use crate::market::types::MarketOverviewSnapshot;
use crate::market::upstream::{UpstreamError, UpstreamSource};

/// 默认跟踪的symbol集合（共振分解key按这个范围写）
const DEFAULT_TRACKED: [&str; 4] = ["BTC-USDT", "ETH-USDT", "SOL-USDT", "BNB-USDT"];

/// 聚合周期报告
#[derive(Debug, Default)]
pub struct CycleReport {
    pub tickers_seen: usize,
    pub keys_written: usize,
    pub keys_skipped: usize,
}

/// 缓存聚合器
///
/// 独立于读取流量，周期性地 拉取 -> 计算 -> 写穿透，保持缓存温热。
/// 聚合器是派生指标的唯一权威写入方；读取路径的回填只是临时补位，
/// 会被下一次聚合写入覆盖。
pub struct MarketAggregator {
    store: Arc<TierStore>,
    upstream: Arc<dyn UpstreamSource>,
    enrichment: Option<EnrichmentFetcher>,
    tracked: Vec<String>,
    movers_depth: usize,
    signals_depth: usize,
}

impl MarketAggregator {
    pub fn new(store: Arc<TierStore>, upstream: Arc<dyn UpstreamSource>) -> Self {
        Self::with_options(
            store,
            upstream,
            EnrichmentFetcher::from_env(),
            env_csv("TRACKED_INST_IDS", &DEFAULT_TRACKED),
            env_u64("MOVERS_DEPTH", 20) as usize,
            env_u64("SIGNALS_DEPTH", 20) as usize,
        )
    }

    pub fn with_options(
        store: Arc<TierStore>,
        upstream: Arc<dyn UpstreamSource>,
        enrichment: Option<EnrichmentFetcher>,
        tracked: Vec<String>,
        movers_depth: usize,
        signals_depth: usize,
    ) -> Self {
        Self {
            store,
            upstream,
            enrichment,
            tracked,
            movers_depth,
            signals_depth,
        }
    }

    /// 执行一个聚合周期：Fetching -> Computing -> Writing
    ///
    /// 上游整体失败返回Err，由调度层记录，循环继续；
    /// 部分symbol缺失按部分结果继续，绝不用全零快照覆盖已有好值。
    pub async fn run_cycle(&self) -> Result<CycleReport, UpstreamError> {
        let mut report = CycleReport::default();

        // Fetching
        let tickers = self.upstream.fetch_tickers().await?;
        report.tickers_seen = tickers.len();

        // Computing
        // 本轮原始结果为占位值时整个key跳过：不做carry_forward，
        // 否则空轮会反复续写旧值，让死掉的上游看起来一直新鲜
        let raw_overview = compute::overview(&tickers);
        let overview = if raw_overview.is_placeholder() {
            None
        } else {
            let mut overview = match self
                .store
                .get_any_json::<MarketOverviewSnapshot>(keys::MARKET_OVERVIEW)
                .await
            {
                Some(prev) => raw_overview.carry_forward(&prev.value),
                None => raw_overview,
            };
            if let Some(enrichment) = &self.enrichment {
                enrichment.apply(&mut overview).await;
            }
            Some(overview)
        };

        let movers = compute::movers(&tickers, self.movers_depth);
        let signals = compute::signals(&tickers, self.signals_depth);

        // Writing
        match &overview {
            Some(overview) => {
                self.write_guarded(
                    keys::MARKET_OVERVIEW,
                    overview,
                    keys::overview_ttl_secs(),
                    &mut report,
                )
                .await;
            }
            None => {
                warn!("本轮概览为占位值，跳过写入: {}", keys::MARKET_OVERVIEW);
                report.keys_skipped += 1;
            }
        }
        self.write_guarded(keys::MARKET_MOVERS, &movers, keys::movers_ttl_secs(), &mut report)
            .await;
        self.write_guarded(
            keys::ANALYSIS_SIGNALS,
            &signals,
            keys::signals_ttl_secs(),
            &mut report,
        )
        .await;

        for inst_id in &self.tracked {
            if let Some(ticker) = tickers.iter().find(|t| &t.inst_id == inst_id) {
                let breakdown = compute::confluence(ticker);
                self.write_guarded(
                    &keys::confluence_breakdown_key(inst_id),
                    &breakdown,
                    keys::confluence_ttl_secs(),
                    &mut report,
                )
                .await;
            }
        }

        info!(
            "聚合周期完成: tickers={} written={} skipped={}",
            report.tickers_seen, report.keys_written, report.keys_skipped
        );
        Ok(report)
    }

    /// 占位保护写入：本轮算出的是占位值则跳过，让上一个好值自然老化
    async fn write_guarded<T>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
        report: &mut CycleReport,
    ) where
        T: Serialize + ContentQuality,
    {
        if value.is_placeholder() {
            warn!("本轮计算结果为占位值，跳过写入: {}", key);
            report.keys_skipped += 1;
            return;
        }
        let written = self.store.set_json(key, value, ttl_seconds).await;
        if written > 0 {
            report.keys_written += 1;
        } else {
            report.keys_skipped += 1;
        }
    }
}
