use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::discovery::Service;

// 服务实例记录
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceRecord {
    pub id: String,
    pub address: String,
    pub http_port: u32,
    pub grpc_port: u32,
    /// 最近一次注册时间（Unix 秒）
    pub last_seen: i64,
}

impl ServiceRecord {
    /// id 中生成后缀之前的部分即服务名
    pub fn name(&self) -> &str {
        ServiceId::name_of(&self.id)
    }
}

impl From<Service> for ServiceRecord {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            address: service.address,
            http_port: service.http_port,
            grpc_port: service.grpc_port,
            last_seen: service.last_seen,
        }
    }
}

impl From<ServiceRecord> for Service {
    fn from(record: ServiceRecord) -> Self {
        Self {
            id: record.id,
            address: record.address,
            http_port: record.http_port,
            grpc_port: record.grpc_port,
            last_seen: record.last_seen,
        }
    }
}

/// 带服务名前缀的实例标识，格式 `<name>-<uuid>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceId {
    name: String,
    id: Uuid,
}

impl ServiceId {
    /// 生成新的实例标识，服务名为空时返回 None
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_lowercase(),
            id: Uuid::new_v4(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // 从完整 id 中截取服务名：去掉末尾的 36 位 UUID 及连接符
    fn name_of(id: &str) -> &str {
        const SUFFIX_LEN: usize = 37;
        let split = id.len().saturating_sub(SUFFIX_LEN);
        if split > 0 && id.is_char_boundary(split) {
            let (name, suffix) = id.split_at(split);
            if suffix.starts_with('-') && Uuid::parse_str(&suffix[1..]).is_ok() {
                return name;
            }
        }
        id
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.id)
    }
}

/// 当前 Unix 时间（秒）
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
