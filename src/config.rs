use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 环境变量前缀，例如 `DISCOVERY_LISTEN_ADDR`
pub const ENV_PREFIX: &str = "DISCOVERY_";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid environment override: {0}")]
    Env(#[from] envy::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub discovery: DiscoveryConfig,
    pub instance: InstanceConfig,
}

/// 注册中心服务端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub log_level: String,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// 客户端注册/心跳配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub enabled: bool,
    pub registry_address: String,
    /// 为 0 时关闭周期注册
    pub register_interval_secs: u64,
    pub startup_grace_secs: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub deregister_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            registry_address: "http://discoveryd:8000".to_string(),
            register_interval_secs: 60,
            startup_grace_secs: 3,
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            deregister_timeout_secs: 5,
        }
    }
}

impl DiscoveryConfig {
    pub fn register_interval(&self) -> Duration {
        Duration::from_secs(self.register_interval_secs)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn deregister_timeout(&self) -> Duration {
        Duration::from_secs(self.deregister_timeout_secs)
    }
}

/// 当前实例对外公布的信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub name: String,
    pub address: String,
    pub http_port: u32,
    pub grpc_port: u32,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            name: "service".to_string(),
            address: "localhost".to_string(),
            http_port: 8001,
            grpc_port: 8002,
        }
    }
}

// 环境变量覆盖项，全部可选
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    listen_addr: Option<String>,
    log_level: Option<String>,
    shutdown_timeout_secs: Option<u64>,
    enabled: Option<bool>,
    registry_address: Option<String>,
    register_interval_secs: Option<u64>,
    startup_grace_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    deregister_timeout_secs: Option<u64>,
    instance_name: Option<String>,
    instance_address: Option<String>,
    http_port: Option<u32>,
    grpc_port: Option<u32>,
}

impl Config {
    /// 按 配置文件 -> 环境变量 的顺序加载配置
    ///
    /// 文件路径取自 `DISCOVERY_CONFIG`，默认 `config.toml`，文件不存在时使用默认值。
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(format!("{ENV_PREFIX}CONFIG"))
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_env()?;
        config.apply_overrides(overrides);
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config_str)?)
    }

    fn apply_overrides(&mut self, env: EnvOverrides) {
        let server = &mut self.server;
        if let Some(v) = env.listen_addr {
            server.listen_addr = v;
        }
        if let Some(v) = env.log_level {
            server.log_level = v;
        }
        if let Some(v) = env.shutdown_timeout_secs {
            server.shutdown_timeout_secs = v;
        }

        let discovery = &mut self.discovery;
        if let Some(v) = env.enabled {
            discovery.enabled = v;
        }
        if let Some(v) = env.registry_address {
            discovery.registry_address = v;
        }
        if let Some(v) = env.register_interval_secs {
            discovery.register_interval_secs = v;
        }
        if let Some(v) = env.startup_grace_secs {
            discovery.startup_grace_secs = v;
        }
        if let Some(v) = env.request_timeout_secs {
            discovery.request_timeout_secs = v;
        }
        if let Some(v) = env.connect_timeout_secs {
            discovery.connect_timeout_secs = v;
        }
        if let Some(v) = env.deregister_timeout_secs {
            discovery.deregister_timeout_secs = v;
        }

        let instance = &mut self.instance;
        if let Some(v) = env.instance_name {
            instance.name = v;
        }
        if let Some(v) = env.instance_address {
            instance.address = v;
        }
        if let Some(v) = env.http_port {
            instance.http_port = v;
        }
        if let Some(v) = env.grpc_port {
            instance.grpc_port = v;
        }
    }
}
