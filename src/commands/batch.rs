//! # batch 命令实现
//!
//! 并行计算目录下的全部 QCSchema 输入。
//!
//! ## 功能
//! - 收集输入文件（跳过已生成的 `.out.json`）
//! - rayon 并行计算，共享同一个 harness
//! - 每个输入写出 `<stem>.out.json`
//! - 汇总 CSV
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用 `batch/`, `harness/`, `utils/output.rs`

use super::{read_input, result_path, write_json, HarnessSettings, RESULT_SUFFIX};
use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::batch::BatchArgs;
use crate::error::{HarnessError, Result};
use crate::harness::ProgramHarness;
use crate::models::{AtomicResult, TaskConfig};
use crate::utils::output;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CSV 汇总行
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub input: String,
    pub output: String,
    pub method: String,
    pub driver: String,
    pub fctldash: String,
    pub natom: usize,
    pub energy: Option<f64>,
}

impl SummaryRow {
    fn new(input: &Path, output: &Path, result: &AtomicResult) -> Self {
        let fctldash = result
            .extras
            .get("info")
            .and_then(|info| info.get("fctldash"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        SummaryRow {
            input: input.display().to_string(),
            output: output.display().to_string(),
            method: result.model.method.clone(),
            driver: result.driver.to_string(),
            fctldash,
            natom: result.molecule.natom(),
            energy: result.properties.return_energy,
        }
    }
}

/// 写出 CSV 汇总
pub fn write_summary(path: &Path, rows: &[SummaryRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| HarnessError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 单个输入与其结果文件
#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// 为每个输入确定结果路径
///
/// 指定输出目录时按相对 `input_root` 的子目录镜像存放；两个输入落到同一结果文件时报错。
pub fn plan_jobs(
    files: &[PathBuf],
    input_root: &Path,
    output_dir: Option<&Path>,
) -> Result<Vec<BatchJob>> {
    let mut seen: HashMap<PathBuf, &Path> = HashMap::new();
    let mut jobs = Vec::with_capacity(files.len());

    for input in files {
        let target_dir = output_dir.map(|dir| {
            let rel = input
                .parent()
                .and_then(|parent| parent.strip_prefix(input_root).ok())
                .unwrap_or_else(|| Path::new(""));
            dir.join(rel)
        });
        let output = result_path(input, target_dir.as_deref());

        if let Some(previous) = seen.insert(output.clone(), input.as_path()) {
            return Err(HarnessError::InvalidArgument(format!(
                "'{}' and '{}' would both write '{}'",
                previous.display(),
                input.display(),
                output.display()
            )));
        }
        jobs.push(BatchJob {
            input: input.clone(),
            output,
        });
    }

    Ok(jobs)
}

fn process_one(
    harness: &dyn ProgramHarness,
    config: &TaskConfig,
    job: &BatchJob,
    overwrite: bool,
) -> ProcessResult<SummaryRow> {
    if job.output.exists() && !overwrite {
        return ProcessResult::Skipped(job.input.display().to_string());
    }

    let outcome = read_input(&job.input)
        .and_then(|input| harness.compute(&input, config))
        .and_then(|result| {
            if let Some(dir) = job.output.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|e| HarnessError::FileWriteError {
                    path: dir.display().to_string(),
                    source: e,
                })?;
            }
            write_json(&job.output, &result)?;
            Ok(SummaryRow::new(&job.input, &job.output, &result))
        });

    match outcome {
        Ok(row) => ProcessResult::Success(row),
        Err(e) => ProcessResult::Failed(job.input.display().to_string(), e.to_string()),
    }
}

/// 执行 batch 命令
pub fn execute(args: BatchArgs, settings: &HarnessSettings) -> Result<()> {
    output::print_header("Batch Dispersion Corrections");

    let config = TaskConfig {
        ncores: args.ncores,
        ..Default::default()
    };
    config.validate()?;

    let harness = settings.build_harness()?;
    harness.found(true)?;

    let files = FileCollector::new(args.input_dir.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .exclude_suffix(RESULT_SUFFIX)
        .collect()?;
    let jobs = plan_jobs(&files, &args.input_dir, args.output_dir.as_deref())?;

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!(
        "Found {} input(s), running {} in parallel",
        jobs.len(),
        runner.jobs()
    ));

    let result = runner.run(&jobs, |job| process_one(&harness, &config, job, args.overwrite))?;

    if !result.successes.is_empty() {
        write_summary(&args.summary, &result.successes)?;
        output::print_success(&format!("Summary saved to '{}'", args.summary.display()));
    }

    for (path, err) in &result.failures {
        output::print_warning(&format!("{}: {}", path, err));
    }
    for path in &result.skipped {
        output::print_skip(&format!("{} (result exists, use --overwrite)", path));
    }

    output::print_done(&format!(
        "{} succeeded, {} skipped, {} failed ({} total)",
        result.success(),
        result.skipped.len(),
        result.failed(),
        result.total()
    ));

    if result.failed() > 0 {
        return Err(HarnessError::Other(format!(
            "{} of {} inputs failed",
            result.failed(),
            result.total()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::dftd4::DFTD4_METADATA;
    use crate::harness::HarnessMetadata;
    use crate::models::schema::{Model, Molecule};
    use crate::models::{AtomicInput, AtomicResultProperties, Driver, Provenance};
    use serde_json::json;

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![
            SummaryRow {
                input: "a.json".into(),
                output: "a.out.json".into(),
                method: "pbe".into(),
                driver: "energy".into(),
                fctldash: "pbe-d4".into(),
                natom: 2,
                energy: Some(-2.0e-4),
            },
            SummaryRow {
                input: "b.json".into(),
                output: "b.out.json".into(),
                method: "".into(),
                driver: "gradient".into(),
                fctldash: "".into(),
                natom: 3,
                energy: None,
            },
        ];
        write_summary(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("input,output,method,driver,fctldash,natom,energy")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("a.json,a.out.json,pbe,energy,pbe-d4,2,-"));
        let energy: f64 = first.rsplit(',').next().unwrap().parse().unwrap();
        assert!((energy + 2.0e-4).abs() < 1e-15);
        assert_eq!(lines.next(), Some("b.json,b.out.json,,gradient,,3,"));
    }

    /// 固定能量的 harness
    struct FixedEnergy;

    impl ProgramHarness for FixedEnergy {
        fn metadata(&self) -> &HarnessMetadata {
            &DFTD4_METADATA
        }

        fn found(&self, _raise_error: bool) -> Result<bool> {
            Ok(true)
        }

        fn get_version(&self) -> Result<String> {
            Ok("3.6.0".to_string())
        }

        fn compute(&self, input: &AtomicInput, _config: &TaskConfig) -> Result<AtomicResult> {
            Ok(AtomicResult::from_input(
                input,
                AtomicResultProperties {
                    return_energy: Some(1.0),
                    calcinfo_natom: Some(input.molecule.natom()),
                },
                json!(1.0),
                Provenance {
                    creator: "dftd4".into(),
                    version: "3.6.0".into(),
                    routine: "test".into(),
                },
            ))
        }
    }

    fn write_sample_input(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let input = AtomicInput::new(
            Molecule::new(vec!["He".into()], vec![0.0, 0.0, 0.0]),
            Driver::Energy,
            Model::new("pbe-d4"),
        );
        write_json(path, &input).unwrap();
    }

    #[test]
    fn test_same_stem_in_subdirectories_kept_apart() {
        let root = tempfile::tempdir().unwrap();
        let inputs = root.path().join("inputs");
        let out = root.path().join("out");
        let files = vec![inputs.join("a/x.json"), inputs.join("b/x.json")];
        for file in &files {
            write_sample_input(file);
        }

        let jobs = plan_jobs(&files, &inputs, Some(&out)).unwrap();
        assert_eq!(jobs[0].output, out.join("a/x.out.json"));
        assert_eq!(jobs[1].output, out.join("b/x.out.json"));

        let config = TaskConfig::default();
        for job in &jobs {
            assert!(matches!(
                process_one(&FixedEnergy, &config, job, false),
                ProcessResult::Success(_)
            ));
        }
        assert!(out.join("a/x.out.json").is_file());
        assert!(out.join("b/x.out.json").is_file());

        // 第二次运行时两个结果都已存在
        assert!(matches!(
            process_one(&FixedEnergy, &config, &jobs[1], false),
            ProcessResult::Skipped(_)
        ));
    }

    #[test]
    fn test_colliding_outputs_rejected() {
        let inputs = Path::new("inputs");
        let files = vec![inputs.join("x.json"), inputs.join("x.txt")];
        assert!(matches!(
            plan_jobs(&files, inputs, Some(Path::new("out"))),
            Err(HarnessError::InvalidArgument(_))
        ));
        assert!(matches!(
            plan_jobs(&files, inputs, None),
            Err(HarnessError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_results_next_to_inputs_by_default() {
        let inputs = Path::new("inputs");
        let files = vec![inputs.join("a/x.json"), inputs.join("b/x.json")];
        let jobs = plan_jobs(&files, inputs, None).unwrap();
        assert_eq!(jobs[0].output, PathBuf::from("inputs/a/x.out.json"));
        assert_eq!(jobs[1].output, PathBuf::from("inputs/b/x.out.json"));
    }
}
