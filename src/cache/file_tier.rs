use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::app_config::env::env_or_default;
use crate::cache::tier::{CacheEnvelope, CacheError, CacheTier, TierKind};

const DEFAULT_BRIDGE_DIR: &str = "/tmp/market_pulse_bridge";

/// 跨进程文件桥（tier 3）
///
/// 每个key对应共享目录下一个JSON文件，供无法连接Redis的协作进程读取。
/// 写入走 临时文件 + rename，单key写入对读者原子可见。
pub struct FileBridgeTier {
    dir: PathBuf,
}

impl FileBridgeTier {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// 共享目录取自 CACHE_BRIDGE_DIR
    pub fn from_env() -> Self {
        Self::new(PathBuf::from(env_or_default(
            "CACHE_BRIDGE_DIR",
            DEFAULT_BRIDGE_DIR,
        )))
    }

    /// key含":"等目录非法字符，统一替换
    fn file_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", sanitized))
    }

    async fn remove_file(path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            debug!("清除过期桥文件失败: {:?}: {}", path, e);
        }
    }
}

#[async_trait]
impl CacheTier for FileBridgeTier {
    fn kind(&self) -> TierKind {
        TierKind::FileBridge
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEnvelope<Value>>, CacheError> {
        let path = self.file_path(key);

        let payload = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Unavailable(format!("{:?}: {}", path, e))),
        };

        let envelope: CacheEnvelope<Value> = serde_json::from_str(&payload)?;
        if envelope.is_evictable() {
            Self::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(envelope))
    }

    async fn set(&self, key: &str, envelope: &CacheEnvelope<Value>) -> Result<(), CacheError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::Unavailable(format!("创建桥目录失败: {}", e)))?;

        let path = self.file_path(key);
        let tmp_path = self.dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let payload = serde_json::to_string(envelope)?;

        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|e| CacheError::Unavailable(format!("写临时文件失败: {}", e)))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| CacheError::Unavailable(format!("rename失败: {}", e)))?;
        Ok(())
    }
}
