use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use serde::{Serialize, de::DeserializeOwned};

use super::keys::{self, REVOKED_SENTINEL};
use super::{CacheError, CacheStore};

/// 前缀清理的错误，区分“无法枚举”和“部分删除失败”
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    #[error("failed to scan cache keys: {0}")]
    Scan(#[source] CacheError),
    #[error("failed to delete {failed} of {total} cache keys: {first}")]
    Delete {
        failed: usize,
        total: usize,
        #[source]
        first: CacheError,
    },
}

/// 凭证缓存，基于共享键值存储的类型化操作
#[derive(Clone)]
pub struct CredentialCache {
    store: Arc<dyn CacheStore>,
}

impl CredentialCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// 读取 JSON 值，反序列化失败按未命中处理
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    pub async fn set_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let json = serde_json::to_string(value)?;
        self.store.set_ex(key, &json, ttl).await
    }

    /// 先枚举所有匹配前缀的键，再逐个删除，返回删除数量
    pub async fn scan_and_delete_prefix(&self, prefix: &str) -> Result<usize, CleanupError> {
        let keys = self
            .store
            .scan_prefix(prefix)
            .await
            .map_err(CleanupError::Scan)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let total = keys.len();
        let results = join_all(keys.iter().map(|key| self.store.delete(key))).await;
        let mut errors = results.into_iter().filter_map(Result::err);

        match errors.next() {
            None => Ok(total),
            Some(first) => Err(CleanupError::Delete {
                failed: 1 + errors.count(),
                total,
                first,
            }),
        }
    }

    pub async fn revoke_token(&self, token: &str, ttl: Duration) -> Result<(), CacheError> {
        self.store
            .set_ex(&keys::revoked_token_key(token), REVOKED_SENTINEL, ttl)
            .await
    }

    /// 键不存在时为 `false`，只有存储本身出错才返回错误
    pub async fn is_token_revoked(&self, token: &str) -> Result<bool, CacheError> {
        let value = self.store.get(&keys::revoked_token_key(token)).await?;
        Ok(value.as_deref() == Some(REVOKED_SENTINEL))
    }

    pub async fn increment_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        self.store.incr_window(key, window).await
    }
}
