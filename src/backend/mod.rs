//! # 色散后端模块
//!
//! 定义 harness 委托计算的后端接口，以及驱动 `dftd4` 可执行程序的默认实现。
//!
//! ## 依赖关系
//! - 被 `harness/` 使用
//! - 使用 `models/`
//! - 子模块: locate, program

pub mod locate;
pub mod program;

pub use program::Dftd4Program;

use crate::error::Result;
use crate::models::{AtomicInput, AtomicResult, TaskConfig};

use std::path::{Path, PathBuf};

/// 后端接口：定位、版本查询、QCSchema 请求到结果的转换
pub trait DispersionBackend: Send + Sync {
    /// 后端程序名
    fn name(&self) -> &str;

    /// 查找后端程序，未安装时返回 None
    fn locate(&self) -> Option<PathBuf>;

    /// 后端自报的原始版本字符串
    fn version(&self, exe: &Path) -> Result<String>;

    /// 执行计算
    fn run_qcschema(&self, input: &AtomicInput, config: &TaskConfig) -> Result<AtomicResult>;
}
