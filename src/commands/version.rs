//! # version 命令实现
//!
//! ## 依赖关系
//! - 使用 `harness/`, `utils/output.rs`

use super::HarnessSettings;
use crate::error::Result;
use crate::harness::ProgramHarness;
use crate::utils::output;

/// 打印 dftd4 版本
pub fn execute(settings: &HarnessSettings) -> Result<()> {
    let harness = settings.build_harness()?;
    let version = harness.get_version()?;
    output::print_field("dftd4", &version);
    Ok(())
}
