use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use market_pulse::cache::{CacheEnvelope, CacheTier, MemoryTier, TierStore};
use market_pulse::market::keys;
use market_pulse::market::{
    DataSource, MarketDataService, MarketOverviewSnapshot, MoverEntry, MoversSnapshot,
    TickerRecord, UpstreamError, UpstreamSource,
};
use market_pulse::time_util;

/// 可编程的上游行情源
enum MockBehavior {
    Tickers(Vec<TickerRecord>),
    Unavailable,
    ConfigError,
}

struct MockUpstream {
    behavior: Mutex<MockBehavior>,
    calls: AtomicUsize,
}

impl MockUpstream {
    fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamSource for MockUpstream {
    async fn fetch_tickers(&self) -> Result<Vec<TickerRecord>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &*self.behavior.lock().await {
            MockBehavior::Tickers(tickers) => Ok(tickers.clone()),
            MockBehavior::Unavailable => {
                Err(UpstreamError::Unavailable("请求超时".to_string()))
            }
            MockBehavior::ConfigError => {
                Err(UpstreamError::Config("OKX_BASE_URL 为空".to_string()))
            }
        }
    }
}

fn ticker(inst_id: &str, last: f64, change: f64, vol: f64) -> TickerRecord {
    TickerRecord {
        inst_id: inst_id.to_string(),
        inst_type: "SPOT".to_string(),
        last_price: last,
        change_pct_24h: change,
        volume_24h: vol,
        ts_ms: time_util::now_millis(),
    }
}

fn sample_tickers() -> Vec<TickerRecord> {
    vec![
        ticker("BTC-USDT", 85941.8, 1.5, 1.0e9),
        ticker("ETH-USDT", 3200.0, -0.8, 4.0e8),
        ticker("SOL-USDT", 150.0, 7.2, 2.0e8),
    ]
}

fn service_with(
    upstream: Arc<MockUpstream>,
) -> (MarketDataService, Arc<TierStore>, Arc<MemoryTier>) {
    let memory = Arc::new(MemoryTier::new());
    let store = Arc::new(TierStore::new(vec![
        memory.clone() as Arc<dyn CacheTier>
    ]));
    let service = MarketDataService::new(Arc::clone(&store), upstream);
    (service, store, memory)
}

#[tokio::test]
async fn test_cache_miss_triggers_live_fetch_and_backfill() {
    let upstream = MockUpstream::new(MockBehavior::Tickers(sample_tickers()));
    let (service, store, _memory) = service_with(upstream.clone());

    let data = service.get_market_overview().await.unwrap();
    assert_eq!(data.source, DataSource::LiveFetch);
    approx::assert_relative_eq!(data.value.btc_price, 85941.8);
    assert_eq!(upstream.call_count(), 1);

    // 回填是fire-and-forget，稍等后缓存应已可见
    tokio::time::sleep(Duration::from_millis(100)).await;
    let cached = store
        .get_json::<MarketOverviewSnapshot>(keys::MARKET_OVERVIEW)
        .await
        .expect("回填后应命中缓存");
    approx::assert_relative_eq!(cached.value.btc_price, 85941.8);

    // 第二次读取走缓存，不再请求上游
    let data = service.get_market_overview().await.unwrap();
    assert!(matches!(data.source, DataSource::CacheTier { .. }));
    assert_eq!(upstream.call_count(), 1);
}

#[tokio::test]
async fn test_fresh_cache_hit_makes_no_upstream_call() {
    let upstream = MockUpstream::new(MockBehavior::Unavailable);
    let (service, store, _memory) = service_with(upstream.clone());

    let snapshot = MarketOverviewSnapshot {
        btc_price: 85000.0,
        gainers_count: 56,
        losers_count: 494,
        total_volume_24h: 1.0e9,
        ..Default::default()
    };
    store
        .set_json(keys::MARKET_OVERVIEW, &snapshot, keys::overview_ttl_secs())
        .await;

    let data = service.get_market_overview().await.unwrap();
    match data.source {
        DataSource::CacheTier { age_seconds, .. } => assert!(age_seconds <= 1),
        other => panic!("expected cache hit, got {:?}", other),
    }
    assert_eq!(upstream.call_count(), 0);
}

#[tokio::test]
async fn test_fresh_placeholder_in_cache_still_falls_back() {
    let upstream = MockUpstream::new(MockBehavior::Tickers(sample_tickers()));
    let (service, store, _memory) = service_with(upstream.clone());

    // 新鲜但全零的空壳：后台写入进程从未成功跑过的签名
    store
        .set_json(
            keys::MARKET_OVERVIEW,
            &MarketOverviewSnapshot::default(),
            keys::overview_ttl_secs(),
        )
        .await;

    let data = service.get_market_overview().await.unwrap();
    assert_eq!(data.source, DataSource::LiveFetch);
    assert!(data.value.btc_price > 0.0);
    assert_eq!(upstream.call_count(), 1);
}

#[tokio::test]
async fn test_degraded_returns_stale_last_known_value() {
    let upstream = MockUpstream::new(MockBehavior::Unavailable);
    let (service, _store, memory) = service_with(upstream.clone());

    // 过期但内容完好的最后已知值
    let snapshot = MarketOverviewSnapshot {
        btc_price: 84000.0,
        gainers_count: 100,
        losers_count: 400,
        total_volume_24h: 8.0e8,
        ..Default::default()
    };
    let envelope = CacheEnvelope {
        value: serde_json::to_value(&snapshot).unwrap(),
        written_at: time_util::now_millis() - 180_000,
        ttl_seconds: 60,
    };
    memory
        .set(keys::MARKET_OVERVIEW, &envelope)
        .await
        .unwrap();

    let data = service.get_market_overview().await.unwrap();
    assert_eq!(data.source, DataSource::Degraded);
    approx::assert_relative_eq!(data.value.btc_price, 84000.0);
}

#[tokio::test]
async fn test_degraded_empty_as_last_resort_never_throws() {
    let upstream = MockUpstream::new(MockBehavior::Unavailable);
    let (service, _store, _memory) = service_with(upstream.clone());

    // 缓存空、上游不可用：显式降级空快照，而不是异常
    let data = service.get_market_overview().await.unwrap();
    assert_eq!(data.source, DataSource::Degraded);
    assert!(data.is_degraded());
    approx::assert_relative_eq!(data.value.btc_price, 0.0);
}

#[tokio::test]
async fn test_config_error_propagates_as_hard_failure() {
    let upstream = MockUpstream::new(MockBehavior::ConfigError);
    let (service, _store, _memory) = service_with(upstream.clone());

    let result = service.get_market_overview().await;
    assert!(matches!(result, Err(UpstreamError::Config(_))));
}

#[tokio::test]
async fn test_concurrent_fallback_backfills_are_idempotent() {
    let upstream = MockUpstream::new(MockBehavior::Tickers(sample_tickers()));
    let (service, store, _memory) = service_with(upstream.clone());
    let service = Arc::new(service);

    // 同一过期key上的两个并发读各自触发回退与回填
    let s1 = Arc::clone(&service);
    let s2 = Arc::clone(&service);
    let (r1, r2) = tokio::join!(s1.get_market_overview(), s2.get_market_overview());

    let d1 = r1.unwrap();
    let d2 = r2.unwrap();
    approx::assert_relative_eq!(d1.value.btc_price, 85941.8);
    approx::assert_relative_eq!(d2.value.btc_price, 85941.8);

    // 最终缓存值是其中一次完整拉取的快照，不是两次写交错出的混合体
    tokio::time::sleep(Duration::from_millis(100)).await;
    let cached = store
        .get_json::<MarketOverviewSnapshot>(keys::MARKET_OVERVIEW)
        .await
        .unwrap();
    approx::assert_relative_eq!(cached.value.btc_price, 85941.8);
    assert_eq!(cached.value.gainers_count, 2);
    assert_eq!(cached.value.losers_count, 1);
}

#[tokio::test]
async fn test_movers_limit_truncates_cached_depth() {
    let upstream = MockUpstream::new(MockBehavior::Unavailable);
    let (service, store, _memory) = service_with(upstream.clone());

    let movers = MoversSnapshot {
        gainers: (0..5)
            .map(|i| MoverEntry {
                inst_id: format!("G{}-USDT", i),
                last_price: 1.0,
                change_pct_24h: 10.0 - i as f64,
                volume_24h: 100.0,
            })
            .collect(),
        losers: vec![],
        updated_at_ms: time_util::now_millis(),
    };
    store
        .set_json(keys::MARKET_MOVERS, &movers, keys::movers_ttl_secs())
        .await;

    let data = service.get_top_movers(2).await.unwrap();
    assert_eq!(data.value.gainers.len(), 2);
    assert_eq!(data.value.gainers[0].inst_id, "G0-USDT");
}
