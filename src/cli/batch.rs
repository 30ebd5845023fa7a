//! # batch 子命令 CLI 定义
//!
//! 并行计算目录下的全部 QCSchema 输入
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use clap::Args;
use std::path::PathBuf;

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing QCSchema input JSON files (or a single file)
    pub input_dir: PathBuf,

    /// File pattern(s) to match, comma separated
    #[arg(short, long, default_value = "*.json")]
    pub pattern: String,

    /// Search subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of inputs computed in parallel (0 = all CPUs)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Threads handed to each dftd4 run
    #[arg(long, default_value_t = 1)]
    pub ncores: usize,

    /// Directory for result files (default: next to each input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// CSV summary of all results
    #[arg(long, default_value = "dispersion_summary.csv")]
    pub summary: PathBuf,

    /// Recompute inputs whose result file already exists
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
