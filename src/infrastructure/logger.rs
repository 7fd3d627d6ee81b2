//! 日志模块
//!
//! 基于 tracing 的日志初始化

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 默认过滤规则，可通过 RUST_LOG 覆盖
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// 初始化日志系统
pub fn init() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化日志系统，已初始化时静默忽略（测试中多次调用）
pub fn try_init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
