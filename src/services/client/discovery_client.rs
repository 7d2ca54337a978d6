use std::future::Future;
use tonic::transport::{Channel, Endpoint};

use super::{DiscoveryClientConfig, DiscoveryClientError};
use crate::discovery::{
    DeregisterServiceRequest, LookupServicesRequest, RegisterServiceRequest,
    discovery_service_client::DiscoveryServiceClient,
};
use crate::services::registry::ServiceRecord;

/// 注册中心的三个 RPC
///
/// 心跳状态机只依赖这个 trait，测试中可以替换为内存实现。
#[tonic::async_trait]
pub trait RegistryApi: Send + Sync {
    async fn register(&self, record: ServiceRecord) -> Result<ServiceRecord, DiscoveryClientError>;

    async fn deregister(&self, id: &str) -> Result<String, DiscoveryClientError>;

    async fn lookup(&self, name_prefix: &str) -> Result<Vec<ServiceRecord>, DiscoveryClientError>;
}

/// 注册中心客户端
///
/// 无状态：不重试、不缓存，每次调用都带超时。
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    config: DiscoveryClientConfig,
    client: DiscoveryServiceClient<Channel>,
}

impl DiscoveryClient {
    /// 创建客户端，连接延迟到第一次调用时建立
    ///
    /// 注册中心不可达不会在这里报错，而是表现为后续调用的传输错误。
    pub fn new(config: DiscoveryClientConfig) -> Result<Self, DiscoveryClientError> {
        let endpoint = Endpoint::from_shared(config.registry_address.clone())?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);

        let channel = endpoint.connect_lazy();
        let client = DiscoveryServiceClient::new(channel);

        Ok(Self { config, client })
    }

    /// 便捷的创建方法，使用默认配置
    pub fn connect(registry_address: &str) -> Result<Self, DiscoveryClientError> {
        let config = DiscoveryClientConfig {
            registry_address: registry_address.to_string(),
            ..Default::default()
        };
        Self::new(config)
    }

    pub fn config(&self) -> &DiscoveryClientConfig {
        &self.config
    }

    // 超时视同传输错误
    async fn with_timeout<T, F>(&self, call: F) -> Result<T, DiscoveryClientError>
    where
        F: Future<Output = Result<tonic::Response<T>, tonic::Status>>,
    {
        match tokio::time::timeout(self.config.request_timeout, call).await {
            Ok(result) => Ok(result?.into_inner()),
            Err(_) => Err(DiscoveryClientError::Timeout),
        }
    }
}

#[tonic::async_trait]
impl RegistryApi for DiscoveryClient {
    async fn register(&self, record: ServiceRecord) -> Result<ServiceRecord, DiscoveryClientError> {
        let mut client = self.client.clone();
        let request = RegisterServiceRequest {
            service: Some(record.into()),
        };

        let response = self
            .with_timeout(client.register_service(request))
            .await?;

        response
            .service
            .map(ServiceRecord::from)
            .ok_or(DiscoveryClientError::InvalidResponse("service"))
    }

    async fn deregister(&self, id: &str) -> Result<String, DiscoveryClientError> {
        let mut client = self.client.clone();
        let request = DeregisterServiceRequest { id: id.to_string() };

        let response = self
            .with_timeout(client.deregister_service(request))
            .await?;

        Ok(response.id)
    }

    async fn lookup(&self, name_prefix: &str) -> Result<Vec<ServiceRecord>, DiscoveryClientError> {
        let mut client = self.client.clone();
        let request = LookupServicesRequest {
            name_prefix: name_prefix.to_string(),
        };

        let response = self
            .with_timeout(client.lookup_services(request))
            .await?;

        Ok(response.services.into_iter().map(ServiceRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_address() {
        let result = DiscoveryClient::connect("not a uri");
        assert!(matches!(result, Err(DiscoveryClientError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unreachable_registry() {
        let config = DiscoveryClientConfig {
            // 保留端口，没有服务监听
            registry_address: "http://127.0.0.1:1".to_string(),
            request_timeout: std::time::Duration::from_secs(2),
            connect_timeout: std::time::Duration::from_secs(1),
        };
        let client = DiscoveryClient::new(config).unwrap();

        let result = client.lookup("").await;
        assert!(matches!(
            result,
            Err(DiscoveryClientError::Grpc(_) | DiscoveryClientError::Timeout)
        ));
    }
}
