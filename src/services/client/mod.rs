pub mod config;
pub mod discovery_client;
pub mod error;
pub mod registration;

pub use config::*;
pub use discovery_client::*;
pub use error::*;
pub use registration::*;
