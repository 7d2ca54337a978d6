use grpc_discovery::config::Config;
use grpc_discovery::server::BoxError;
use grpc_discovery::{server, telemetry};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    telemetry::init_tracing(&config.server.log_level);

    tracing::info!(listen_addr = %config.server.listen_addr, "Starting discovery server...");

    let cancel = CancellationToken::new();
    let mut server = tokio::spawn(server::start(config.server.clone(), cancel.clone()));

    tokio::select! {
        res = &mut server => {
            // 服务在收到信号前退出，视为启动失败
            res??;
            return Ok(());
        }
        () = server::shutdown_signal() => {
            tracing::info!("stop signal received, starting shutdown");
        }
    }

    cancel.cancel();
    match tokio::time::timeout(config.server.shutdown_timeout(), server).await {
        Ok(res) => res??,
        Err(_) => {
            tracing::error!(
                timeout_secs = config.server.shutdown_timeout_secs,
                "service shutdown timeout expired"
            );
            return Err("shutdown timeout expired".into());
        }
    }

    tracing::info!("Discovery server shutdown complete");
    Ok(())
}
