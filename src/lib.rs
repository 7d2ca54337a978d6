pub mod discovery {
    tonic::include_proto!("discovery.v1");
}
pub mod config;
pub mod server;
pub mod services;
pub mod telemetry;
