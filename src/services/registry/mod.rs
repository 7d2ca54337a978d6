//! Registry service module
//!
//! This module contains the service registry implementation split into logical components:
//! - `types`: Service records and instance identifiers
//! - `store`: The in-memory registry and its register/deregister/lookup/evict operations
//! - `cleanup`: Background eviction sweep
//! - `service` / `grpc_impl`: gRPC trait implementation

pub mod cleanup;
pub mod error;
pub mod grpc_impl;
pub mod service;
pub mod store;
pub mod types;

// Re-export public types for easier access
pub use cleanup::EVICTION_INTERVAL;
pub use error::RegistryError;
pub use service::MyDiscoveryService;
pub use store::{SERVICE_TTL, ServiceRegistry};
pub use types::{ServiceId, ServiceRecord, unix_now};
