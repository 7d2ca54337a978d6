pub mod client;
pub mod registry;

pub use client::{DiscoveryClient, RegistrationClient, RegistrationHandle, RegistrationState, RegistryApi};
pub use registry::{MyDiscoveryService, ServiceId, ServiceRecord, ServiceRegistry};
