use std::time::Duration;

use crate::config::DiscoveryConfig;

/// 连续注册失败达到该次数后进入 Fatal
pub const MAX_REGISTER_FAILURES: u32 = 3;

/// 注册中心客户端配置
#[derive(Debug, Clone)]
pub struct DiscoveryClientConfig {
    /// 注册中心地址
    pub registry_address: String,
    /// 单次请求超时时间
    pub request_timeout: Duration,
    /// 连接超时时间
    pub connect_timeout: Duration,
}

impl Default for DiscoveryClientConfig {
    fn default() -> Self {
        Self {
            registry_address: "http://localhost:8000".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&DiscoveryConfig> for DiscoveryClientConfig {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            registry_address: config.registry_address.clone(),
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

/// 心跳注册配置
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    /// 注册间隔，为 0 时不注册
    pub register_interval: Duration,
    /// 启动后首次注册前的等待时间
    pub startup_grace: Duration,
    /// 单次心跳注册的超时时间，超时计为一次失败
    pub register_timeout: Duration,
    /// 关闭时注销请求的超时时间
    pub deregister_timeout: Duration,
    pub max_failures: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            register_interval: Duration::from_secs(60),
            startup_grace: Duration::from_secs(3),
            register_timeout: Duration::from_secs(5),
            deregister_timeout: Duration::from_secs(5),
            max_failures: MAX_REGISTER_FAILURES,
        }
    }
}

impl From<&DiscoveryConfig> for RegistrationConfig {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            register_interval: config.register_interval(),
            startup_grace: config.startup_grace(),
            register_timeout: config.request_timeout(),
            deregister_timeout: config.deregister_timeout(),
            max_failures: MAX_REGISTER_FAILURES,
        }
    }
}
