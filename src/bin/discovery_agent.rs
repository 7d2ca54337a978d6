//! Discovery agent binary.
//!
//! Advertises one service instance to the registry until shutdown, then
//! deregisters it. Exits non-zero when the registry stays unreachable.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use grpc_discovery::config::Config;
use grpc_discovery::server::{self, BoxError};
use grpc_discovery::services::client::{
    DiscoveryClient, DiscoveryClientConfig, RegistrationClient, RegistrationConfig,
};
use grpc_discovery::services::registry::{ServiceId, ServiceRecord};
use grpc_discovery::telemetry;

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    let config = Config::load()?;
    telemetry::init_tracing(&config.server.log_level);

    let service_id = ServiceId::new(&config.instance.name)
        .ok_or("instance name must not be empty")?
        .to_string();

    tracing::info!(service_id = %service_id, "Starting discovery agent...");

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        server::shutdown_signal().await;
        tracing::info!("stop signal received, starting shutdown");
        cancel_on_signal.cancel();
    });

    if !config.discovery.enabled {
        tracing::info!("Service discovery disabled, waiting for shutdown");
        cancel.cancelled().await;
        return Ok(());
    }

    let client = DiscoveryClient::new(DiscoveryClientConfig::from(&config.discovery))?;
    let registration = RegistrationClient::new(
        Arc::new(client),
        RegistrationConfig::from(&config.discovery),
    );

    let instance = config.instance.clone();
    let handle = registration.start(
        move || ServiceRecord {
            id: service_id.clone(),
            address: instance.address.clone(),
            http_port: instance.http_port,
            grpc_port: instance.grpc_port,
            last_seen: 0,
        },
        &cancel,
    );

    if let Err(e) = handle.join().await {
        // 实例已无法被发现，不应继续静默运行
        tracing::error!(error = %e, "internal service error");
        return Err(e.into());
    }

    tracing::info!("Discovery agent shutdown complete");
    Ok(())
}
