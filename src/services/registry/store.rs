use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use super::error::RegistryError;
use super::types::{ServiceRecord, unix_now};

/// 记录超过该时长未注册即可被清理
pub const SERVICE_TTL: Duration = Duration::from_secs(5 * 60);

/// 服务注册表：实例 id -> 实例记录
///
/// 所有读写都经过同一把读写锁，查询使用读锁，注册、注销和过期清理使用写锁。
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, ServiceRecord>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册或覆盖一个实例（后写入者胜出），返回存储的记录
    pub async fn register(&self, record: ServiceRecord) -> Result<ServiceRecord, RegistryError> {
        if record.id.is_empty() {
            return Err(RegistryError::MissingField("id"));
        }

        self.services
            .write()
            .await
            .insert(record.id.clone(), record.clone());

        tracing::info!(
            service_id = %record.id,
            address = %record.address,
            last_seen = record.last_seen,
            "service registered"
        );

        Ok(record)
    }

    /// 注销实例，不存在时同样视为成功
    pub async fn deregister(&self, id: &str) -> Result<String, RegistryError> {
        if id.is_empty() {
            return Err(RegistryError::MissingField("id"));
        }

        let removed = self.services.write().await.remove(id).is_some();

        tracing::info!(service_id = %id, removed, "service deregistered");

        Ok(id.to_string())
    }

    /// 返回 id 以 `name_prefix` 开头的全部实例，空前缀返回全部；结果无序
    pub async fn lookup(&self, name_prefix: &str) -> Vec<ServiceRecord> {
        self.services
            .read()
            .await
            .iter()
            .filter(|(id, _)| id.starts_with(name_prefix))
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// 清理过期实例，返回清理数量
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(unix_now()).await
    }

    /// 以给定时间为基准清理过期实例
    ///
    /// `last_seen` 严格早于 `now - SERVICE_TTL` 的记录被移除，恰好等于阈值的保留。
    pub async fn evict_expired_at(&self, now: i64) -> usize {
        let ttl = i64::try_from(SERVICE_TTL.as_secs()).unwrap_or(i64::MAX);
        let expiry = now.saturating_sub(ttl);

        let mut services = self.services.write().await;
        let before = services.len();

        services.retain(|id, record| {
            if record.last_seen > now {
                // 时钟偏差，保留并等待下次注册
                tracing::debug!(
                    service_id = %id,
                    last_seen = record.last_seen,
                    now,
                    "Service timestamp is in the future, skipping"
                );
                return true;
            }

            if record.last_seen < expiry {
                tracing::info!(
                    service_id = %id,
                    elapsed_secs = now.saturating_sub(record.last_seen),
                    ttl_secs = ttl,
                    "expired service evicted"
                );
                return false;
            }

            true
        });

        before - services.len()
    }

    pub async fn len(&self) -> usize {
        self.services.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.services.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(id: &str, last_seen: i64) -> ServiceRecord {
        ServiceRecord {
            id: id.to_string(),
            address: format!("{id}.local"),
            http_port: 8001,
            grpc_port: 8002,
            last_seen,
        }
    }

    #[tokio::test]
    async fn test_register_requires_id() {
        let registry = ServiceRegistry::new();
        registry.register(record("svc-a", 1)).await.unwrap();

        let err = registry.register(record("", 2)).await.unwrap_err();
        assert_eq!(err, RegistryError::MissingField("id"));
        assert_eq!(err.to_string(), "error: missing required 'id' field");

        // 注册表保持不变
        let services = registry.lookup("").await;
        assert_eq!(services, vec![record("svc-a", 1)]);
    }

    #[tokio::test]
    async fn test_register_echoes_record() {
        let registry = ServiceRegistry::new();
        let stored = registry.register(record("svc-a", 42)).await.unwrap();
        assert_eq!(stored, record("svc-a", 42));
    }

    #[tokio::test]
    async fn test_register_last_write_wins() {
        let registry = ServiceRegistry::new();
        registry.register(record("svc-a", 200)).await.unwrap();

        // 后完成的写入覆盖，即便时间戳更早
        let mut older = record("svc-a", 100);
        older.address = "10.0.0.9".to_string();
        registry.register(older.clone()).await.unwrap();

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.lookup("svc-a").await, vec![older]);
    }

    #[tokio::test]
    async fn test_overlapping_registrations() {
        let registry = Arc::new(ServiceRegistry::new());

        // 持有写锁，让两次注册排队等待
        let guard = registry.services.write().await;

        let first = tokio::spawn({
            let registry = registry.clone();
            async move { registry.register(record("svc-a", 500)).await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let registry = registry.clone();
            async move { registry.register(record("svc-a", 100)).await }
        });
        tokio::task::yield_now().await;

        drop(guard);
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        // tokio 的读写锁按 FIFO 顺序授予，第二个完成的写入生效
        assert_eq!(registry.lookup("").await, vec![record("svc-a", 100)]);
    }

    #[tokio::test]
    async fn test_deregister() {
        let registry = ServiceRegistry::new();
        registry.register(record("svc-a", 1)).await.unwrap();
        registry.register(record("svc-b", 1)).await.unwrap();

        let id = registry.deregister("svc-a").await.unwrap();
        assert_eq!(id, "svc-a");
        assert_eq!(registry.lookup("").await, vec![record("svc-b", 1)]);
    }

    #[tokio::test]
    async fn test_deregister_is_idempotent() {
        let registry = ServiceRegistry::new();
        registry.register(record("svc-a", 1)).await.unwrap();

        assert_eq!(registry.deregister("missing").await.unwrap(), "missing");
        assert_eq!(registry.deregister("svc-a").await.unwrap(), "svc-a");
        assert_eq!(registry.deregister("svc-a").await.unwrap(), "svc-a");
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_deregister_requires_id() {
        let registry = ServiceRegistry::new();
        registry.register(record("svc-a", 1)).await.unwrap();

        let err = registry.deregister("").await.unwrap_err();
        assert_eq!(err.to_string(), "error: missing required 'id' field");
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_lookup_by_prefix() {
        let registry = ServiceRegistry::new();
        for id in ["test-service-a", "test-service-b", "service-a"] {
            registry.register(record(id, 1)).await.unwrap();
        }

        let mut ids: Vec<String> = registry
            .lookup("test-service")
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["test-service-a", "test-service-b"]);

        assert_eq!(registry.lookup("").await.len(), 3);
        assert!(registry.lookup("unknown").await.is_empty());
    }

    #[tokio::test]
    async fn test_evict_expired() {
        let registry = ServiceRegistry::new();
        let now = 1_700_000_000;
        registry.register(record("stale-a", now - 6 * 60)).await.unwrap();
        registry.register(record("stale-b", now - 60 * 60)).await.unwrap();
        registry.register(record("fresh", now - 60)).await.unwrap();

        let evicted = registry.evict_expired_at(now).await;

        assert_eq!(evicted, 2);
        assert_eq!(registry.lookup("").await, vec![record("fresh", now - 60)]);
    }

    #[tokio::test]
    async fn test_evict_boundary() {
        let registry = ServiceRegistry::new();
        let now = 1_700_000_000;
        let ttl = i64::try_from(SERVICE_TTL.as_secs()).unwrap();
        registry.register(record("at-ttl", now - ttl)).await.unwrap();
        registry.register(record("past-ttl", now - ttl - 1)).await.unwrap();

        assert_eq!(registry.evict_expired_at(now).await, 1);
        assert_eq!(registry.lookup("").await, vec![record("at-ttl", now - ttl)]);
    }

    #[tokio::test]
    async fn test_evict_skips_future_timestamps() {
        let registry = ServiceRegistry::new();
        let now = 1_700_000_000;
        registry.register(record("skewed", now + 30)).await.unwrap();

        assert_eq!(registry.evict_expired_at(now).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_evict_out_of_range_timestamps() {
        // 启用 info 级别日志，保证日志字段会被求值
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let registry = ServiceRegistry::new();
        let now = 1_700_000_000;
        registry.register(record("min", i64::MIN)).await.unwrap();
        registry.register(record("negative", -1)).await.unwrap();
        registry.register(record("max", i64::MAX)).await.unwrap();
        registry.register(record("fresh", now)).await.unwrap();

        assert_eq!(registry.evict_expired_at(now).await, 2);

        let mut ids: Vec<String> = registry
            .lookup("")
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["fresh", "max"]);
    }

    #[tokio::test]
    async fn test_evict_uses_wall_clock() {
        let registry = ServiceRegistry::new();
        registry.register(record("fresh", unix_now())).await.unwrap();
        registry.register(record("stale", unix_now() - 6 * 60)).await.unwrap();

        assert_eq!(registry.evict_expired().await, 1);
        assert_eq!(registry.lookup("").await.len(), 1);
    }
}
