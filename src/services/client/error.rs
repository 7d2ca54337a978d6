use tonic::Status;

/// 注册中心客户端错误类型
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("gRPC error: {0}")]
    Grpc(#[from] Status),
    #[error("Timeout error")]
    Timeout,
    #[error("Invalid response: missing '{0}' field")]
    InvalidResponse(&'static str),
    #[error("Registration failed {attempts} consecutive times, last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
    #[error("Registration task failed: {0}")]
    Task(String),
}
