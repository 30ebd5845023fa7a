//! # 日志初始化
//!
//! `tracing-subscriber` 输出到 stderr，不干扰 stdout 上的表格和 JSON。
//! 设置了 `RUST_LOG` 时以其为准，否则按 `-v` 次数选择级别。
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 使用 `tracing-subscriber` crate

use tracing_subscriber::EnvFilter;

/// `-v` 次数对应的默认过滤级别
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// 初始化全局 subscriber；重复调用时静默忽略
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("qcdisp={}", default_directive(verbose))));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
