//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `probe`: 检查 dftd4 是否可用
//! - `version`: 打印 dftd4 版本
//! - `compute`: 计算单个 QCSchema 输入
//! - `batch`: 并行计算目录下的多个输入
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: batch, compute, probe

pub mod batch;
pub mod compute;
pub mod probe;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// qcdisp - DFT-D4 色散校正的 QCSchema harness
#[derive(Parser, Debug)]
#[command(name = "qcdisp")]
#[command(version)]
#[command(about = "Run DFT-D4 dispersion corrections on QCSchema inputs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the dftd4 executable (default: search PATH)
    #[arg(long, global = true, env = "QCDISP_DFTD4_EXE")]
    pub dftd4_exe: Option<PathBuf>,

    /// JSON file with extra dispersion parameter definitions
    #[arg(long, global = true, env = "QCDISP_DASHCOEFF")]
    pub dashcoeff: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the dftd4 executable can be found
    Probe(probe::ProbeArgs),

    /// Print the normalized dftd4 version
    Version,

    /// Run a single QCSchema input through dftd4
    Compute(compute::ComputeArgs),

    /// Run every QCSchema input in a directory in parallel
    Batch(batch::BatchArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["qcdisp", "probe", "--strict", "-vv", "--dftd4-exe", "/opt/dftd4"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.dftd4_exe, Some(PathBuf::from("/opt/dftd4")));
        match cli.command {
            Commands::Probe(args) => assert!(args.strict),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_compute_defaults() {
        let cli = Cli::try_parse_from(["qcdisp", "compute", "in.json"]).unwrap();
        match cli.command {
            Commands::Compute(args) => {
                assert_eq!(args.input, PathBuf::from("in.json"));
                assert!(args.output.is_none());
                assert_eq!(args.ncores, 1);
                assert_eq!(args.memory, 2.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_batch_defaults() {
        let cli = Cli::try_parse_from(["qcdisp", "batch", "inputs", "-j", "4"]).unwrap();
        match cli.command {
            Commands::Batch(args) => {
                assert_eq!(args.jobs, 4);
                assert_eq!(args.pattern, "*.json");
                assert!(!args.recursive);
                assert!(!args.overwrite);
                assert_eq!(args.summary, PathBuf::from("dispersion_summary.csv"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
