//! # probe 命令实现
//!
//! 检查 dftd4 是否可用，并打印 harness 声明的能力。
//!
//! ## 依赖关系
//! - 使用 `cli/probe.rs` 定义的参数
//! - 使用 `harness/`, `utils/output.rs`

use super::HarnessSettings;
use crate::cli::probe::ProbeArgs;
use crate::error::Result;
use crate::harness::{HarnessMetadata, ProgramHarness};
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Capability")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn capability_rows(meta: &HarnessMetadata) -> Vec<CapabilityRow> {
    let flag = |name, value: bool| CapabilityRow {
        name,
        value: value.to_string(),
    };
    vec![
        CapabilityRow {
            name: "name",
            value: meta.name.to_string(),
        },
        flag("scratch", meta.scratch),
        flag("thread_safe", meta.thread_safe),
        flag("thread_parallel", meta.thread_parallel),
        flag("node_parallel", meta.node_parallel),
        flag("managed_memory", meta.managed_memory),
    ]
}

/// 执行 probe 命令
pub fn execute(args: ProbeArgs, settings: &HarnessSettings) -> Result<()> {
    let harness = settings.build_harness()?;

    output::print_header("DFT-D4 Harness");
    println!("{}", Table::new(capability_rows(harness.metadata())));
    println!();

    if harness.found(args.strict)? {
        output::print_success("dftd4 found");
        match harness.get_version() {
            Ok(version) => output::print_field("version", &version),
            Err(e) => output::print_warning(&format!("could not read version: {}", e)),
        }
    } else {
        output::print_warning("dftd4 not found; set --dftd4-exe or add it to PATH");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::dftd4::DFTD4_METADATA;

    #[test]
    fn test_capability_rows() {
        let rows = capability_rows(&DFTD4_METADATA);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].value, "dftd4");
        assert_eq!(rows[2].name, "thread_safe");
        assert_eq!(rows[2].value, "true");
        assert!(Table::new(rows).to_string().contains("managed_memory"));
    }
}
