//! # qcdisp - DFT-D4 色散校正 harness
//!
//! 把 `dftd4` 程序接入 QCSchema 风格的计算编排：
//! 规范化方法名、解析色散参数方案、委托后端计算、补充派生量。
//!
//! ## 子命令
//! - `probe`   - 检查 dftd4 是否可用
//! - `version` - 打印 dftd4 版本
//! - `compute` - 计算单个 QCSchema 输入
//! - `batch`   - 并行计算目录下的多个输入
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/      (批量收集与并行执行)
//!   │     └── harness/    (ProgramHarness 与 Dftd4Harness)
//!   │           ├── dispersion/ (别名表、参数表、方案解析)
//!   │           ├── backend/    (dftd4 可执行程序驱动)
//!   │           └── models/     (QCSchema 数据模型)
//!   ├── utils/      (输出、进度条、日志)
//!   └── error.rs    (错误处理)
//! ```

mod backend;
mod batch;
mod cli;
mod commands;
mod dispersion;
mod error;
mod harness;
mod models;
mod utils;

use clap::Parser;
use cli::Cli;
use commands::HarnessSettings;

fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    utils::logging::init(cli.verbose);

    let settings = HarnessSettings {
        dftd4_exe: cli.dftd4_exe,
        dashcoeff: cli.dashcoeff,
        ..Default::default()
    };

    if let Err(e) = commands::run(cli.command, &settings) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
