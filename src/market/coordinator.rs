use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{is_usable, ContentQuality, TierStore};
use crate::market::keys;
use crate::market::types::{
    ConfluenceBreakdown, DataSource, MarketData, MarketOverviewSnapshot, MoversSnapshot,
    SignalsSnapshot,
};
use crate::market::upstream::{UpstreamError, UpstreamSource};

/// 读取路径协调器
///
/// API层的唯一入口。缓存可用直接返回；不可用转实时拉取并异步回填；
/// 两路都失败时返回显式标记的降级响应。只有上游配置错误向外硬失败。
pub struct MarketDataService {
    store: Arc<TierStore>,
    upstream: Arc<dyn UpstreamSource>,
}

impl MarketDataService {
    pub fn new(store: Arc<TierStore>, upstream: Arc<dyn UpstreamSource>) -> Self {
        Self { store, upstream }
    }

    /// 大盘概览
    pub async fn get_market_overview(
        &self,
    ) -> Result<MarketData<MarketOverviewSnapshot>, UpstreamError> {
        self.read_through(
            keys::MARKET_OVERVIEW,
            keys::overview_ttl_secs(),
            self.upstream.fetch_overview(),
        )
        .await
    }

    /// 涨跌幅榜，limit截断在读取侧做，缓存里存完整榜单
    pub async fn get_top_movers(
        &self,
        limit: usize,
    ) -> Result<MarketData<MoversSnapshot>, UpstreamError> {
        let data = self
            .read_through(
                keys::MARKET_MOVERS,
                keys::movers_ttl_secs(),
                self.upstream.fetch_movers(limit.max(20)),
            )
            .await?;
        Ok(MarketData {
            value: data.value.truncate(limit),
            source: data.source,
        })
    }

    /// 信号列表
    pub async fn get_signals(
        &self,
        limit: usize,
    ) -> Result<MarketData<SignalsSnapshot>, UpstreamError> {
        let data = self
            .read_through(
                keys::ANALYSIS_SIGNALS,
                keys::signals_ttl_secs(),
                self.upstream.fetch_signals(limit.max(20)),
            )
            .await?;
        Ok(MarketData {
            value: data.value.truncate(limit),
            source: data.source,
        })
    }

    /// 单symbol共振分解
    pub async fn get_confluence_breakdown(
        &self,
        inst_id: &str,
    ) -> Result<MarketData<ConfluenceBreakdown>, UpstreamError> {
        self.read_through(
            &keys::confluence_breakdown_key(inst_id),
            keys::confluence_ttl_secs(),
            self.upstream.fetch_confluence(inst_id),
        )
        .await
    }

    /// 读取算法：缓存探测 -> 质量判定 -> 实时回退 -> 异步回填 -> 降级兜底
    ///
    /// fetch是惰性future，只有缓存拿不到可用值才await。
    async fn read_through<T, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        fetch: Fut,
    ) -> Result<MarketData<T>, UpstreamError>
    where
        T: ContentQuality + Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        if let Some(hit) = self.store.get_json::<T>(key).await {
            if is_usable(Some(&hit)) {
                return Ok(MarketData {
                    value: hit.value,
                    source: DataSource::CacheTier {
                        tier: hit.tier,
                        age_seconds: hit.age_seconds,
                    },
                });
            }
        }

        debug!("缓存不可用，转实时拉取: {}", key);
        match fetch.await {
            Ok(snapshot) if !snapshot.is_placeholder() => {
                // 回填不阻塞本次响应；并发回退的整值写入天然幂等，后写者胜
                let store = Arc::clone(&self.store);
                let key_owned = key.to_string();
                let value = snapshot.clone();
                tokio::spawn(async move {
                    store.set_json(&key_owned, &value, ttl_seconds).await;
                });
                return Ok(MarketData {
                    value: snapshot,
                    source: DataSource::LiveFetch,
                });
            }
            Ok(_) => {
                warn!("上游返回占位值，转降级处理: {}", key);
            }
            Err(UpstreamError::Config(msg)) => {
                // 配置缺陷不属于可降级的瞬态失败
                return Err(UpstreamError::Config(msg));
            }
            Err(e) => {
                warn!("实时拉取失败，转降级处理: key={}: {}", key, e);
            }
        }

        // 降级：最后已知值（即使过期）优于空快照，两者都显式标记
        if let Some(stale) = self.store.get_any_json::<T>(key).await {
            warn!(
                "降级响应：返回最后已知值 key={} tier={} age={}s",
                key, stale.tier, stale.age_seconds
            );
            return Ok(MarketData {
                value: stale.value,
                source: DataSource::Degraded,
            });
        }

        warn!("降级响应：无任何可用数据，返回空快照 key={}", key);
        Ok(MarketData {
            value: T::default(),
            source: DataSource::Degraded,
        })
    }
}
