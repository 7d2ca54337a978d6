use tonic::{Request, Response, Status};

use super::error::RegistryError;
use super::service::MyDiscoveryService;
use crate::discovery::{
    DeregisterServiceRequest, DeregisterServiceResponse, LookupServicesRequest,
    LookupServicesResponse, RegisterServiceRequest, RegisterServiceResponse, Service,
    discovery_service_server::DiscoveryService,
};

// 为结构体实现 gRPC 服务 trait
#[tonic::async_trait]
impl DiscoveryService for MyDiscoveryService {
    async fn register_service(
        &self,
        request: Request<RegisterServiceRequest>,
    ) -> Result<Response<RegisterServiceResponse>, Status> {
        let service = request
            .into_inner()
            .service
            .ok_or(RegistryError::MissingField("service"))?;

        let stored = self.registry.register(service.into()).await?;

        Ok(Response::new(RegisterServiceResponse {
            service: Some(stored.into()),
        }))
    }

    async fn deregister_service(
        &self,
        request: Request<DeregisterServiceRequest>,
    ) -> Result<Response<DeregisterServiceResponse>, Status> {
        let req = request.into_inner();
        let id = self.registry.deregister(&req.id).await?;

        Ok(Response::new(DeregisterServiceResponse { id }))
    }

    async fn lookup_services(
        &self,
        request: Request<LookupServicesRequest>,
    ) -> Result<Response<LookupServicesResponse>, Status> {
        let req = request.into_inner();
        let services = self
            .registry
            .lookup(&req.name_prefix)
            .await
            .into_iter()
            .map(Service::from)
            .collect::<Vec<_>>();

        tracing::debug!(
            name_prefix = %req.name_prefix,
            count = services.len(),
            "Lookup services"
        );

        Ok(Response::new(LookupServicesResponse { services }))
    }
}
