//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `harness/`, `models/`, `utils/`
//! - 子模块: batch, compute, probe, version

pub mod batch;
pub mod compute;
pub mod probe;
pub mod version;

use crate::backend::Dftd4Program;
use crate::cli::Commands;
use crate::dispersion::{DashCoeffResolver, DashCoeffTable, DispersionAliasTable};
use crate::error::{HarnessError, Result};
use crate::harness::{Dftd4Harness, VersionCache};
use crate::models::AtomicInput;

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 结果文件后缀
pub const RESULT_SUFFIX: &str = ".out.json";

/// 构建 harness 所需的全局设置
#[derive(Debug, Clone, Default)]
pub struct HarnessSettings {
    /// 显式指定的 dftd4 路径
    pub dftd4_exe: Option<PathBuf>,

    /// 追加到内置参数表的定义文件
    pub dashcoeff: Option<PathBuf>,

    /// 进程内所有 harness 共用的版本缓存
    pub version_cache: Arc<VersionCache>,
}

impl HarnessSettings {
    pub fn build_harness(&self) -> Result<Dftd4Harness> {
        let harness = Dftd4Harness::new(Dftd4Program::new(self.dftd4_exe.clone()))
            .with_version_cache(Arc::clone(&self.version_cache));

        let path = match &self.dashcoeff {
            Some(path) => path,
            None => return Ok(harness),
        };
        let text = fs::read_to_string(path).map_err(|e| HarnessError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let supplement: Value = serde_json::from_str(&text)?;

        let aliases = DispersionAliasTable::builtin();
        let mut table = DashCoeffTable::builtin();
        table.supplement(&supplement, aliases)?;
        Ok(harness.with_resolver(DashCoeffResolver::new(aliases, table)))
    }
}

/// 执行命令
pub fn run(cmd: Commands, settings: &HarnessSettings) -> Result<()> {
    match cmd {
        Commands::Probe(args) => probe::execute(args, settings),
        Commands::Version => version::execute(settings),
        Commands::Compute(args) => compute::execute(args, settings),
        Commands::Batch(args) => batch::execute(args, settings),
    }
}

/// 读取并校验 QCSchema 输入
pub fn read_input(path: &Path) -> Result<AtomicInput> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    AtomicInput::from_json_str(&text)
}

/// 写出 pretty JSON
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| HarnessError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// `<dir>/<stem>.out.json`，未给出目录时放在输入旁边
pub fn result_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "result".to_string());
    let dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}{}", stem, RESULT_SUFFIX))
}
