use tonic::Status;

/// 注册中心请求校验错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("error: missing required '{0}' field")]
    MissingField(&'static str),
}

impl From<RegistryError> for Status {
    fn from(err: RegistryError) -> Self {
        Status::invalid_argument(err.to_string())
    }
}
