//! # compute 命令实现
//!
//! 计算单个 QCSchema 输入的色散校正。
//!
//! ## 功能
//! - 读取并校验输入 JSON
//! - 调用 harness 计算
//! - 以表格打印 qcvars 中的标量
//! - 写出结果 JSON
//!
//! ## 依赖关系
//! - 使用 `cli/compute.rs` 定义的参数
//! - 使用 `harness/`, `models/`, `utils/`

use super::{read_input, result_path, write_json, HarnessSettings};
use crate::cli::compute::ComputeArgs;
use crate::error::Result;
use crate::harness::ProgramHarness;
use crate::models::{AtomicResult, TaskConfig};
use crate::utils::{output, progress};

use serde_json::Value;
use tabled::{Table, Tabled};

/// qcvars 表格行
#[derive(Debug, Clone, Tabled)]
struct QcvarRow {
    #[tabled(rename = "Quantity")]
    name: String,
    #[tabled(rename = "Value (Eh)")]
    value: String,
}

/// 标量直接显示，数组只显示长度
fn qcvar_rows(result: &AtomicResult) -> Vec<QcvarRow> {
    let qcvars = match result.extras.get("qcvars").and_then(Value::as_object) {
        Some(map) => map,
        None => return Vec::new(),
    };

    qcvars
        .iter()
        .map(|(name, value)| QcvarRow {
            name: name.clone(),
            value: match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(|x| format!("{:.10}", x))
                    .unwrap_or_else(|| n.to_string()),
                Value::Array(items) => format!("[{} values]", items.len()),
                other => other.to_string(),
            },
        })
        .collect()
}

/// 执行 compute 命令
pub fn execute(args: ComputeArgs, settings: &HarnessSettings) -> Result<()> {
    let config = TaskConfig {
        ncores: args.ncores,
        memory: args.memory,
        scratch_directory: args.scratch_dir.clone(),
        ..Default::default()
    };
    config.validate()?;

    let input = read_input(&args.input)?;
    let harness = settings.build_harness()?;

    let spinner = progress::create_spinner(&format!("Running dftd4 on {}", args.input.display()));
    let outcome = harness.compute(&input, &config);
    spinner.finish_and_clear();
    let result = outcome?;

    let out_path = args
        .output
        .clone()
        .unwrap_or_else(|| result_path(&args.input, None));
    write_json(&out_path, &result)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    output::print_header("Dispersion Correction");
    output::print_field("method", &result.model.method);
    output::print_field("driver", &result.driver.to_string());
    if let Some(fctldash) = result
        .extras
        .get("info")
        .and_then(|info| info.get("fctldash"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        output::print_field("fctldash", fctldash);
    }
    println!();

    let rows = qcvar_rows(&result);
    if rows.is_empty() {
        output::print_warning("no dispersion plan was resolved; qcvars omitted");
        if let Ok(energy) = result.return_energy() {
            output::print_field("return_energy", &format!("{:.10}", energy));
        }
    } else {
        println!("{}", Table::new(rows));
    }
    println!();

    output::print_written(&args.input.display().to_string(), &out_path.display().to_string());
    Ok(())
}
