//! # probe 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/probe.rs`

use clap::Args;

/// probe 子命令参数
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Fail with an install hint when dftd4 is missing
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}
