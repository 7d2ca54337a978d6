use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{DiscoveryClientError, RegistrationConfig, RegistryApi};
use crate::services::registry::{ServiceRecord, unix_now};

/// 心跳注册的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    /// 尚未开始注册，或注册被关闭
    Idle,
    /// 等待启动宽限期结束
    AwaitingFirstRegistration,
    Registered,
    /// 最近的注册失败，`failures` 为连续失败次数
    Retrying { failures: u32 },
    /// 连续失败达到上限，实例已无法被发现
    Fatal,
    Deregistering,
    Stopped,
}

/// 心跳注册客户端：在进程生命周期内维持一条注册记录，关闭时注销
pub struct RegistrationClient<R> {
    registry: Arc<R>,
    config: RegistrationConfig,
}

impl<R> RegistrationClient<R>
where
    R: RegistryApi + 'static,
{
    pub fn new(registry: Arc<R>, config: RegistrationConfig) -> Self {
        Self { registry, config }
    }

    /// 启动状态机
    ///
    /// `supplier` 在每次心跳时调用，返回实例当前的 id、地址和端口。
    /// `shutdown` 取消时进入注销流程。
    pub fn start<F>(self, supplier: F, shutdown: &CancellationToken) -> RegistrationHandle
    where
        F: Fn() -> ServiceRecord + Send + Sync + 'static,
    {
        let cancel = shutdown.child_token();
        let (state_tx, state_rx) = watch::channel(RegistrationState::Idle);

        let task = tokio::spawn(self.run(supplier, cancel.clone(), state_tx));

        RegistrationHandle {
            cancel,
            state: state_rx,
            task,
        }
    }

    async fn run<F>(
        self,
        supplier: F,
        cancel: CancellationToken,
        state: watch::Sender<RegistrationState>,
    ) -> Result<(), DiscoveryClientError>
    where
        F: Fn() -> ServiceRecord + Send + Sync + 'static,
    {
        if self.config.register_interval.is_zero() {
            tracing::info!("Service registration disabled, register interval is zero");
            cancel.cancelled().await;
            state.send_replace(RegistrationState::Stopped);
            return Ok(());
        }

        // 等待本实例的服务完成端口绑定
        state.send_replace(RegistrationState::AwaitingFirstRegistration);
        tokio::select! {
            () = cancel.cancelled() => {
                let id = supplier().id;
                return self.deregister(&id, &state).await;
            }
            () = tokio::time::sleep(self.config.startup_grace) => {}
        }

        let mut interval = tokio::time::interval(self.config.register_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut failures = 0u32;
        let mut id = String::new();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let mut record = supplier();
            record.last_seen = unix_now();
            id.clone_from(&record.id);

            let result =
                match tokio::time::timeout(self.config.register_timeout, self.registry.register(record))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(DiscoveryClientError::Timeout),
                };

            match result {
                Ok(_) => {
                    if failures > 0 {
                        tracing::info!(service_id = %id, failures, "Service registration recovered");
                    }
                    failures = 0;
                    tracing::debug!(service_id = %id, "Service registration refreshed");
                    state.send_replace(RegistrationState::Registered);
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(
                        service_id = %id,
                        error = %e,
                        failures,
                        max_failures = self.config.max_failures,
                        "error registering service for discovery"
                    );

                    if failures >= self.config.max_failures {
                        state.send_replace(RegistrationState::Fatal);
                        return Err(DiscoveryClientError::RetriesExhausted {
                            attempts: failures,
                            last_error: e.to_string(),
                        });
                    }
                    state.send_replace(RegistrationState::Retrying { failures });
                }
            }
        }

        // 先停止定时器，再注销
        drop(interval);
        if id.is_empty() {
            id = supplier().id;
        }
        self.deregister(&id, &state).await
    }

    // 关闭时只注销一次，失败仅记录日志，由注册中心的过期清理兜底
    async fn deregister(
        &self,
        id: &str,
        state: &watch::Sender<RegistrationState>,
    ) -> Result<(), DiscoveryClientError> {
        state.send_replace(RegistrationState::Deregistering);

        match tokio::time::timeout(self.config.deregister_timeout, self.registry.deregister(id)).await
        {
            Ok(Ok(_)) => tracing::info!(service_id = %id, "Service deregistered from discovery"),
            Ok(Err(e)) => {
                tracing::warn!(service_id = %id, error = %e, "Failed to deregister service");
            }
            Err(_) => {
                tracing::warn!(
                    service_id = %id,
                    timeout_secs = self.config.deregister_timeout.as_secs(),
                    "Timed out deregistering service"
                );
            }
        }

        state.send_replace(RegistrationState::Stopped);
        Ok(())
    }
}

/// 运行中的注册任务句柄
#[derive(Debug)]
pub struct RegistrationHandle {
    cancel: CancellationToken,
    state: watch::Receiver<RegistrationState>,
    task: JoinHandle<Result<(), DiscoveryClientError>>,
}

impl RegistrationHandle {
    pub fn state(&self) -> RegistrationState {
        *self.state.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<RegistrationState> {
        self.state.clone()
    }

    /// 触发注销并等待状态机结束
    pub async fn stop(self) -> Result<(), DiscoveryClientError> {
        self.cancel.cancel();
        self.join().await
    }

    /// 等待状态机结束：正常关闭返回 Ok，重试耗尽返回 `RetriesExhausted`
    pub async fn join(self) -> Result<(), DiscoveryClientError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(DiscoveryClientError::Task(e.to_string())),
        }
    }
}
