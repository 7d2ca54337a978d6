use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::store::ServiceRegistry;

/// 过期清理的执行间隔
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

impl ServiceRegistry {
    // 启动过期清理任务，任务归属于 tracker，cancel 触发后退出并释放定时器
    pub fn start_cleanup_task(
        self: &Arc<Self>,
        tracker: &TaskTracker,
        cancel: CancellationToken,
        period: Duration,
    ) {
        let registry = Arc::clone(self);

        tracker.spawn(async move {
            tracing::info!(interval_secs = period.as_secs(), "polling for expired services");

            // 启动后等待一个周期再执行第一次清理
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        tracing::debug!("Eviction task cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        tracing::debug!("Executing service expiration check...");
                        let evicted = registry.evict_expired().await;
                        if evicted > 0 {
                            tracing::info!(expired_count = evicted, "Cleanup check completed");
                        }
                    }
                }
            }
        });
    }
}
