//! # dftd4 可执行程序后端
//!
//! 将 QCSchema 请求翻译为 `dftd4` 命令行调用，并把其 JSON 输出组装为 `AtomicResult`。
//!
//! ## 功能
//! - 写出 XYZ 结构（Å）到私有临时目录，退出时由 `TempDir` 删除
//! - 按方法名 (`--func`) 或显式参数 (`--param`) 调用 dftd4
//! - 读取能量、梯度与成对能量分解
//!
//! ## 依赖关系
//! - 被 `harness/dftd4.rs` 使用
//! - 使用 `backend/locate.rs`, `models/`

use super::locate::locate_program;
use super::DispersionBackend;
use crate::dispersion::ResolvedPlan;
use crate::error::{HarnessError, Result};
use crate::models::{
    AtomicInput, AtomicResult, AtomicResultProperties, Driver, JsonMap, Provenance, TaskConfig,
};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// bohr -> Å
pub const BOHR_TO_ANGSTROM: f64 = 0.529_177_210_67;

pub const ADDITIVE_PAIRWISE_KEY: &str = "additive pairwise energy";
pub const NON_ADDITIVE_PAIRWISE_KEY: &str = "non-additive pairwise energy";

static VERSION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?[0-9A-Za-z.+\-]*)").unwrap());

/// dftd4 命令行后端
#[derive(Debug, Clone)]
pub struct Dftd4Program {
    /// 程序名
    program: String,
    /// 显式指定的可执行文件
    exe: Option<PathBuf>,
}

impl Default for Dftd4Program {
    fn default() -> Self {
        Dftd4Program {
            program: "dftd4".to_string(),
            exe: None,
        }
    }
}

impl Dftd4Program {
    pub fn new(exe: Option<PathBuf>) -> Self {
        Dftd4Program {
            exe,
            ..Default::default()
        }
    }

    fn executable(&self) -> Result<PathBuf> {
        self.locate().ok_or_else(|| HarnessError::MissingDependency {
            name: self.program.clone(),
            hint: "Please install a dftd4 build with the command-line driver enabled".to_string(),
        })
    }

    /// 构建 dftd4 命令行参数（不含结构文件与输出路径）
    fn method_args(input: &AtomicInput) -> Result<Vec<String>> {
        let mut args = Vec::new();

        if input.driver == Driver::Gradient {
            args.push("--grad".to_string());
        }
        if input.keywords.get("pair_resolved") == Some(&Value::Bool(true)) {
            args.push("--pair-resolved".to_string());
        }

        let method = input.model.method.trim();
        if !method.is_empty() {
            args.push("--func".to_string());
            args.push(method.to_lowercase());
            return Ok(args);
        }

        let plan: ResolvedPlan = match input.extras.get("info") {
            Some(info) => serde_json::from_value(info.clone())?,
            None => {
                return Err(HarnessError::SchemaValidation(
                    "no method name and no resolved dispersion parameters were given".to_string(),
                ))
            }
        };

        let param = |name: &str| {
            plan.dashparams.get(name).copied().ok_or_else(|| {
                HarnessError::SchemaValidation(format!("dispersion parameter '{}' missing", name))
            })
        };

        args.push("--param".to_string());
        for name in ["s6", "s8", "a1", "a2"] {
            args.push(param(name)?.to_string());
        }
        args.push("--mbdscale".to_string());
        args.push(param("s9")?.to_string());

        Ok(args)
    }

    /// 写出 XYZ 格式结构
    fn write_xyz(input: &AtomicInput, path: &Path) -> Result<()> {
        let mol = &input.molecule;
        let mut text = format!(
            "{}\n{}\n",
            mol.natom(),
            mol.name.as_deref().unwrap_or("qcdisp")
        );
        for (i, symbol) in mol.symbols.iter().enumerate() {
            let [x, y, z] = mol.position(i);
            text.push_str(&format!(
                "{:<4} {:>20.12} {:>20.12} {:>20.12}\n",
                symbol,
                x * BOHR_TO_ANGSTROM,
                y * BOHR_TO_ANGSTROM,
                z * BOHR_TO_ANGSTROM
            ));
        }
        fs::write(path, text).map_err(|e| HarnessError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 解析 dftd4 JSON 输出
    fn parse_output(input: &AtomicInput, data: &Value, stdout: String) -> Result<AtomicResult> {
        let energy = data.get("energy").and_then(Value::as_f64).ok_or_else(|| {
            HarnessError::SchemaValidation("dftd4 output has no energy".to_string())
        })?;

        let return_result = match input.driver {
            Driver::Gradient => {
                let gradient = data.get("gradient").ok_or_else(|| {
                    HarnessError::SchemaValidation("dftd4 output has no gradient".to_string())
                })?;
                let flat = flatten_numbers(gradient)?;
                json!(flat)
            }
            _ => json!(energy),
        };

        let mut extras = JsonMap::new();
        if input.keywords.get("pair_resolved") == Some(&Value::Bool(true)) {
            let mut pairwise = JsonMap::new();
            for key in [ADDITIVE_PAIRWISE_KEY, NON_ADDITIVE_PAIRWISE_KEY] {
                let block = data.get(key).ok_or_else(|| {
                    HarnessError::SchemaValidation(format!("dftd4 output has no '{}'", key))
                })?;
                pairwise.insert(key.to_string(), block.clone());
            }
            extras.insert("dftd4".to_string(), Value::Object(pairwise));
        }

        let version = data
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let mut result = AtomicResult::from_input(
            input,
            AtomicResultProperties {
                return_energy: Some(energy),
                calcinfo_natom: Some(input.molecule.natom()),
            },
            return_result,
            Provenance {
                creator: "dftd4".to_string(),
                version,
                routine: "dftd4 run".to_string(),
            },
        );
        result.extras = extras;
        result.stdout = Some(stdout).filter(|s| !s.is_empty());
        result.validate()?;
        Ok(result)
    }
}

impl DispersionBackend for Dftd4Program {
    fn name(&self) -> &str {
        &self.program
    }

    fn locate(&self) -> Option<PathBuf> {
        locate_program(self.exe.as_deref(), &self.program)
    }

    fn version(&self, exe: &Path) -> Result<String> {
        let output = Command::new(exe)
            .arg("--version")
            .output()
            .map_err(|e| HarnessError::CommandFailed {
                command: format!("{} --version", exe.display()),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(HarnessError::CommandFailed {
                command: format!("{} --version", exe.display()),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        extract_version(&stdout).ok_or_else(|| {
            HarnessError::Other(format!("Cannot read version from '{}'", stdout.trim()))
        })
    }

    fn run_qcschema(&self, input: &AtomicInput, config: &TaskConfig) -> Result<AtomicResult> {
        match input.driver {
            Driver::Energy | Driver::Gradient => {}
            other => {
                return Err(HarnessError::SchemaValidation(format!(
                    "dftd4 does not support driver '{}'",
                    other
                )))
            }
        }

        let exe = self.executable()?;
        let method_args = Self::method_args(input)?;

        let base = config
            .scratch_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        fs::create_dir_all(&base).map_err(|e| HarnessError::FileWriteError {
            path: base.display().to_string(),
            source: e,
        })?;
        let workdir = tempfile::Builder::new()
            .prefix("qcdisp-")
            .tempdir_in(&base)
            .map_err(|e| HarnessError::FileWriteError {
                path: base.display().to_string(),
                source: e,
            })?;

        let result = self.run_in(&exe, workdir.path(), input, config, &method_args);

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove dftd4 work directory");
        }

        result
    }
}

impl Dftd4Program {
    fn run_in(
        &self,
        exe: &Path,
        workdir: &Path,
        input: &AtomicInput,
        config: &TaskConfig,
        method_args: &[String],
    ) -> Result<AtomicResult> {
        let xyz = workdir.join("input.xyz");
        let json_path = workdir.join("dftd4.json");
        Self::write_xyz(input, &xyz)?;

        let mut cmd = Command::new(exe);
        cmd.arg("run")
            .args(method_args)
            .arg("--json")
            .arg(&json_path)
            .arg("--charge")
            .arg(format!("{}", input.molecule.molecular_charge.round() as i64))
            .arg(&xyz)
            .current_dir(workdir)
            .env("OMP_NUM_THREADS", config.ncores.to_string());

        debug!(command = ?cmd, "running dftd4");

        let output = cmd.output().map_err(|e| HarnessError::CommandFailed {
            command: exe.display().to_string(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(HarnessError::CommandFailed {
                command: format!("{} run {}", exe.display(), method_args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let text = fs::read_to_string(&json_path).map_err(|e| HarnessError::FileReadError {
            path: json_path.display().to_string(),
            source: e,
        })?;
        let data: Value = serde_json::from_str(&text)?;

        Self::parse_output(
            input,
            &data,
            String::from_utf8_lossy(&output.stdout).to_string(),
        )
    }
}

/// 从 `dftd4 --version` 输出中提取版本号
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_TOKEN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// 将任意嵌套的数值数组展平
pub fn flatten_numbers(value: &Value) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    collect_numbers(value, &mut out)?;
    Ok(out)
}

fn collect_numbers(value: &Value, out: &mut Vec<f64>) -> Result<()> {
    match value {
        Value::Number(n) => {
            out.push(n.as_f64().ok_or_else(|| {
                HarnessError::SchemaValidation(format!("non-finite number {}", n))
            })?);
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(|v| collect_numbers(v, out)),
        other => Err(HarnessError::SchemaValidation(format!(
            "expected a numeric array, found {}",
            other
        ))),
    }
}
