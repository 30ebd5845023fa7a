//! # compute 子命令 CLI 定义
//!
//! 读取单个 QCSchema 输入 JSON，计算色散校正并输出结果 JSON
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/compute.rs`

use clap::Args;
use std::path::PathBuf;

/// compute 子命令参数
#[derive(Args, Debug)]
pub struct ComputeArgs {
    /// QCSchema input JSON
    pub input: PathBuf,

    /// Output path for the result JSON (default: <input stem>.out.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Threads handed to dftd4 (OMP_NUM_THREADS)
    #[arg(long, default_value_t = 1)]
    pub ncores: usize,

    /// Memory available to the task in GiB
    #[arg(long, default_value_t = 2.0)]
    pub memory: f64,

    /// Scratch directory for backend work files (default: system temp dir)
    #[arg(long)]
    pub scratch_dir: Option<PathBuf>,

    /// Print the full result JSON to stdout instead of the qcvars table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
