//! # 程序 harness 模块
//!
//! 定义编排器调用外部程序的统一接口 `ProgramHarness`，
//! 以及 DFT-D4 色散校正的实现 `Dftd4Harness`。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `backend/`, `dispersion/`, `models/`
//! - 子模块: dftd4, version

pub mod dftd4;
pub mod version;

pub use dftd4::Dftd4Harness;
pub use version::VersionCache;

use crate::error::Result;
use crate::models::{AtomicInput, AtomicResult, TaskConfig};

use serde::Serialize;

/// harness 向编排器声明的静态能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarnessMetadata {
    pub name: &'static str,
    /// 是否需要临时目录
    pub scratch: bool,
    /// 是否可与其他实例并发运行
    pub thread_safe: bool,
    /// 是否内部多线程
    pub thread_parallel: bool,
    /// 是否跨节点并行
    pub node_parallel: bool,
    /// 是否由编排器管理内存
    pub managed_memory: bool,
}

/// 外部程序 harness 接口
pub trait ProgramHarness: Send + Sync {
    fn metadata(&self) -> &HarnessMetadata;

    /// 检查后端是否可用；`raise_error` 为真时缺失即报错
    fn found(&self, raise_error: bool) -> Result<bool>;

    /// 后端版本（带缓存）
    fn get_version(&self) -> Result<String>;

    /// 执行一次计算
    fn compute(&self, input: &AtomicInput, config: &TaskConfig) -> Result<AtomicResult>;
}
