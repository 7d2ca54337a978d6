use tracing_subscriber::EnvFilter;

/// 初始化全局日志，`RUST_LOG` 优先于配置中的日志级别
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）直接忽略
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .ok();
}
