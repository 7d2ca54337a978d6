use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tonic::transport::Server;

use crate::config::ServerConfig;
use crate::discovery::discovery_service_server::DiscoveryServiceServer;
use crate::services::registry::{EVICTION_INTERVAL, MyDiscoveryService, ServiceRegistry};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub async fn start(config: ServerConfig, cancel: CancellationToken) -> Result<(), BoxError> {
    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;

    // 初始化服务注册表
    let registry = Arc::new(ServiceRegistry::new());

    serve(listener, registry, cancel).await
}

/// 在已绑定的监听器上提供注册中心服务，直到 `cancel` 被触发
///
/// 过期清理任务与服务同生命周期，返回前保证清理任务已退出。
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ServiceRegistry>,
    cancel: CancellationToken,
) -> Result<(), BoxError> {
    let local_addr = listener.local_addr()?;

    let tracker = TaskTracker::new();
    registry.start_cleanup_task(&tracker, cancel.clone(), EVICTION_INTERVAL);
    tracker.close();

    // 创建服务实例
    let discovery_service = MyDiscoveryService::new(registry);

    tracing::info!(addr = %local_addr, "Discovery server listening");

    let result = Server::builder()
        .add_service(DiscoveryServiceServer::new(discovery_service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), cancel.cancelled())
        .await;

    // 服务异常退出时同样停止清理任务
    cancel.cancel();
    tracker.wait().await;

    tracing::info!(addr = %local_addr, "Discovery server stopped");
    result?;
    Ok(())
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
