use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use market_pulse::cache::{
    CacheEnvelope, CacheError, CacheTier, FileBridgeTier, MemoryTier, TierKind, TierStore,
};
use market_pulse::time_util;

/// 始终失败的层，模拟Redis不可达
struct FailingTier;

#[async_trait]
impl CacheTier for FailingTier {
    fn kind(&self) -> TierKind {
        TierKind::Redis
    }

    async fn get(&self, _key: &str) -> Result<Option<CacheEnvelope<Value>>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _envelope: &CacheEnvelope<Value>) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}

fn temp_file_tier() -> Arc<FileBridgeTier> {
    let dir = std::env::temp_dir().join(format!("tier_store_test_{}", uuid::Uuid::new_v4()));
    Arc::new(FileBridgeTier::new(dir))
}

#[tokio::test]
async fn test_write_through_visible_on_each_tier() {
    let memory = Arc::new(MemoryTier::new());
    let file = temp_file_tier();
    let store = TierStore::new(vec![memory.clone() as Arc<dyn CacheTier>, file.clone()]);

    let written = store
        .set("market:overview", json!({"btc_price": 85941.8}), 60)
        .await;
    assert_eq!(written, 2);

    // 每一层单独探测都能立即读到
    let from_memory = memory.get("market:overview").await.unwrap().unwrap();
    assert_eq!(from_memory.value["btc_price"], 85941.8);
    assert!(!from_memory.is_expired());

    let from_file = file.get("market:overview").await.unwrap().unwrap();
    assert_eq!(from_file.value["btc_price"], 85941.8);
    assert!(!from_file.is_expired());
}

#[tokio::test]
async fn test_lazy_ttl_expiry_treated_as_miss() {
    let memory = Arc::new(MemoryTier::new());
    let store = TierStore::new(vec![memory.clone() as Arc<dyn CacheTier>]);

    // 直接写入一条已超TTL但未被物理清除的信封
    let envelope = CacheEnvelope {
        value: json!({"btc_price": 100.0}),
        written_at: time_util::now_millis() - 120_000,
        ttl_seconds: 60,
    };
    memory.set("market:overview", &envelope).await.unwrap();

    // 底层还留着数据，get仍按miss处理
    assert!(memory.get("market:overview").await.unwrap().is_some());
    assert!(store.get("market:overview").await.is_none());

    // get_any能拿到过期值，且标记expired
    let stale = store.get_any("market:overview").await.unwrap();
    assert!(stale.expired);
    assert!(stale.age_seconds >= 120);
}

#[tokio::test]
async fn test_probe_order_fastest_tier_wins() {
    let memory = Arc::new(MemoryTier::new());
    let file = temp_file_tier();
    let store = TierStore::new(vec![memory.clone() as Arc<dyn CacheTier>, file.clone()]);

    memory
        .set("k", &CacheEnvelope::new(json!({"v": "memory"}), 60))
        .await
        .unwrap();
    file.set("k", &CacheEnvelope::new(json!({"v": "file"}), 60))
        .await
        .unwrap();

    let hit = store.get("k").await.unwrap();
    assert_eq!(hit.tier, TierKind::Memory);
    assert_eq!(hit.value["v"], "memory");
}

#[tokio::test]
async fn test_expired_fast_tier_falls_through_to_fresh_slow_tier() {
    let memory = Arc::new(MemoryTier::new());
    let file = temp_file_tier();
    let store = TierStore::new(vec![memory.clone() as Arc<dyn CacheTier>, file.clone()]);

    let expired = CacheEnvelope {
        value: json!({"v": "old"}),
        written_at: time_util::now_millis() - 120_000,
        ttl_seconds: 60,
    };
    memory.set("k", &expired).await.unwrap();
    file.set("k", &CacheEnvelope::new(json!({"v": "fresh"}), 60))
        .await
        .unwrap();

    let hit = store.get("k").await.unwrap();
    assert_eq!(hit.tier, TierKind::FileBridge);
    assert_eq!(hit.value["v"], "fresh");
}

#[tokio::test]
async fn test_failing_tier_absorbed_never_raises() {
    let memory = Arc::new(MemoryTier::new());
    let store = TierStore::new(vec![Arc::new(FailingTier) as Arc<dyn CacheTier>, memory.clone()]);

    // 写入：失败层只记日志，其余层照常写
    let written = store.set("k", json!({"v": 1}), 60).await;
    assert_eq!(written, 1);

    // 读取：失败层按miss处理，降级到下一层
    let hit = store.get("k").await.unwrap();
    assert_eq!(hit.tier, TierKind::Memory);
    assert_eq!(hit.value["v"], 1);
}

#[tokio::test]
async fn test_slow_tier_hit_backfills_faster_tier_preserving_age() {
    let memory = Arc::new(MemoryTier::new());
    let file = temp_file_tier();
    let store = TierStore::new(vec![memory.clone() as Arc<dyn CacheTier>, file.clone()]);

    // 只有慢层有值，写入时间在30秒前
    let written_at = time_util::now_millis() - 30_000;
    let envelope = CacheEnvelope {
        value: json!({"v": 7}),
        written_at,
        ttl_seconds: 60,
    };
    file.set("k", &envelope).await.unwrap();

    let hit = store.get("k").await.unwrap();
    assert_eq!(hit.tier, TierKind::FileBridge);

    // 回填进快层，且保留原始时间戳（回填不伪造新鲜度）
    let promoted = memory.get("k").await.unwrap().unwrap();
    assert_eq!(promoted.written_at, written_at);
    assert!(promoted.age_seconds() >= 30);
}

#[tokio::test]
async fn test_miss_on_all_tiers_is_none() {
    let store = TierStore::new(vec![Arc::new(MemoryTier::new()) as Arc<dyn CacheTier>, temp_file_tier()]);
    assert!(store.get("no:such:key").await.is_none());
    assert!(store.get_any("no:such:key").await.is_none());
}
