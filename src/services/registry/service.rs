use std::sync::Arc;

use super::store::ServiceRegistry;

// 注册中心的 gRPC 服务实现
#[derive(Debug, Clone)]
pub struct MyDiscoveryService {
    pub registry: Arc<ServiceRegistry>,
}

impl MyDiscoveryService {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }
}
