//! # DFT-D4 harness
//!
//! dftd4 后端本身已支持 QCSchema，这里只做一层薄的适配：
//! 规范化方法名与关键字别名、解析参数方案、委托后端计算，
//! 最后在 `extras["qcvars"]` 中补充传统格式的派生量标签。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `backend/`, `dispersion/`, `harness/version.rs`, `models/`

use super::version::{normalize_version, VersionCache};
use super::{HarnessMetadata, ProgramHarness};
use crate::backend::program::{ADDITIVE_PAIRWISE_KEY, NON_ADDITIVE_PAIRWISE_KEY};
use crate::backend::{program::flatten_numbers, DispersionBackend, Dftd4Program};
use crate::dispersion::{
    DashCoeffResolver, DispersionAliasTable, PlanRequest, PlanResolver, D4BJ, D4_SHORT,
};
use crate::error::{HarnessError, Result};
use crate::models::{AtomicInput, AtomicResult, Driver, JsonMap, TaskConfig};

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// 方法名中的引擎前缀
pub const ENGINE_PREFIX: &str = "d4-";

/// 成对能量之和与总能量的容差 (hartree)
pub const PAIRWISE_TOLERANCE: f64 = 1.0e-8;

const INSTALL_HINT: &str = "Please install a dftd4 build with the command-line driver enabled";

pub const DFTD4_METADATA: HarnessMetadata = HarnessMetadata {
    name: "dftd4",
    scratch: false,
    thread_safe: true,
    thread_parallel: false,
    node_parallel: false,
    managed_memory: false,
};

/// DFT-D4 色散校正 harness
pub struct Dftd4Harness {
    backend: Box<dyn DispersionBackend>,
    resolver: Box<dyn PlanResolver>,
    aliases: &'static DispersionAliasTable,
    version_cache: Arc<VersionCache>,
}

impl Default for Dftd4Harness {
    fn default() -> Self {
        Dftd4Harness::new(Dftd4Program::default())
    }
}

impl Dftd4Harness {
    pub fn new(backend: impl DispersionBackend + 'static) -> Self {
        Dftd4Harness {
            backend: Box::new(backend),
            resolver: Box::new(DashCoeffResolver::default()),
            aliases: DispersionAliasTable::builtin(),
            version_cache: Arc::new(VersionCache::new()),
        }
    }

    pub fn with_resolver(mut self, resolver: impl PlanResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// 与其他实例共享版本缓存
    pub fn with_version_cache(mut self, cache: Arc<VersionCache>) -> Self {
        self.version_cache = cache;
        self
    }

    fn missing(&self) -> HarnessError {
        HarnessError::MissingDependency {
            name: self.backend.name().to_string(),
            hint: INSTALL_HINT.to_string(),
        }
    }
}

impl ProgramHarness for Dftd4Harness {
    fn metadata(&self) -> &HarnessMetadata {
        &DFTD4_METADATA
    }

    fn found(&self, raise_error: bool) -> Result<bool> {
        match self.backend.locate() {
            Some(path) => {
                debug!(path = %path.display(), "found {}", self.backend.name());
                Ok(true)
            }
            None if raise_error => Err(self.missing()),
            None => Ok(false),
        }
    }

    fn get_version(&self) -> Result<String> {
        let exe = self.backend.locate().ok_or_else(|| self.missing())?;
        self.version_cache.get_or_try_insert_with(&exe, || {
            let raw = self.backend.version(&exe)?;
            debug!(path = %exe.display(), raw = %raw, "read backend version");
            Ok(normalize_version(&raw))
        })
    }

    fn compute(&self, input_model: &AtomicInput, config: &TaskConfig) -> Result<AtomicResult> {
        self.found(true)?;

        let mut input = input_model.clone();

        // 去掉引擎前缀
        let mut method = strip_engine_prefix(&input_model.model.method).to_string();
        input.model.method = method.clone();

        // 显式方法名优先于参数微调；方案解析失败时交给后端自身的校验去拒绝
        let param_tweaks = if method.is_empty() {
            input_model.keyword("params_tweaks")
        } else {
            None
        };
        let request = PlanRequest {
            verbose: 1,
            name_hint: &method,
            level_hint: input_model.keyword("level_hint"),
            param_tweaks,
            dashcoeff_supplement: input_model.keyword("dashcoeff_supplement"),
        };
        match self.resolver.resolve(&request) {
            Ok(plan) => {
                input
                    .extras
                    .insert("info".to_string(), serde_json::to_value(&plan)?);
            }
            Err(e) if e.is_invalid_plan_input() => {
                debug!(reason = %e, "dispersion plan unresolved, deferring to backend");
            }
            Err(e) => return Err(e),
        }

        // 去掉色散级别后缀
        method = strip_level_suffix(&method, self.aliases);
        input.model.method = method;

        // 统一色散级别别名
        if let Some(Value::String(hint)) = input_model.keywords.get("level_hint") {
            if self.aliases.get(hint) == Some(D4BJ) {
                input
                    .keywords
                    .insert("level_hint".to_string(), json!(D4_SHORT));
            }
        }

        input.validate()?;

        info!(
            method = %input.model.method,
            driver = %input.driver,
            natom = input.molecule.natom(),
            "running dftd4"
        );
        let mut output = self.backend.run_qcschema(&input, config)?;

        merge_extras(&mut output.extras, &input.extras);

        if let Some(info) = input.extras.get("info") {
            let qcvars = derive_qcvars(&input, &output, info)?;
            output.extras.insert("qcvars".to_string(), Value::Object(qcvars));
        }

        Ok(output)
    }
}

/// 去掉一次 `d4-` 前缀
pub fn strip_engine_prefix(method: &str) -> &str {
    method.strip_prefix(ENGINE_PREFIX).unwrap_or(method)
}

/// 去掉所有 D4(BJ) 别名构成的 `-<alias>` 后缀（不区分大小写）
pub fn strip_level_suffix(method: &str, aliases: &DispersionAliasTable) -> String {
    let mut mtd = method.to_string();
    for alias in aliases.aliases_of(D4BJ) {
        let suffix_len = alias.len() + 1;
        if mtd.len() < suffix_len {
            continue;
        }
        let cut = mtd.len() - suffix_len;
        if !mtd.is_char_boundary(cut) {
            continue;
        }
        let tail = &mtd[cut..];
        if tail.starts_with('-') && tail[1..].eq_ignore_ascii_case(alias) {
            mtd.truncate(cut);
        }
    }
    mtd
}

/// 请求的 extras 合并进结果，同名键以请求为准
pub fn merge_extras(target: &mut JsonMap, source: &JsonMap) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

/// 根据方案与结果构建 qcvars
pub fn derive_qcvars(input: &AtomicInput, output: &AtomicResult, info: &Value) -> Result<JsonMap> {
    let qcvkey = info
        .get("fctldash")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_uppercase();

    let mut calcinfo = JsonMap::new();
    let ene = output.return_energy()?;
    calcinfo.insert("CURRENT ENERGY".to_string(), json!(ene));
    calcinfo.insert("DISPERSION CORRECTION ENERGY".to_string(), json!(ene));
    if !qcvkey.is_empty() {
        calcinfo.insert(
            format!("{} DISPERSION CORRECTION ENERGY", qcvkey),
            json!(ene),
        );
    }

    if input.driver == Driver::Gradient {
        let grad = &output.return_result;
        calcinfo.insert("CURRENT GRADIENT".to_string(), grad.clone());
        calcinfo.insert("DISPERSION CORRECTION GRADIENT".to_string(), grad.clone());
        if !qcvkey.is_empty() {
            calcinfo.insert(
                format!("{} DISPERSION CORRECTION GRADIENT", qcvkey),
                grad.clone(),
            );
        }
    }

    if input.keywords.get("pair_resolved") == Some(&Value::Bool(true)) {
        let pairwise = |key: &str| {
            output
                .extras
                .get("dftd4")
                .and_then(|block| block.get(key))
                .ok_or_else(|| {
                    HarnessError::SchemaValidation(format!(
                        "pair-resolved result lacks extras['dftd4']['{}']",
                        key
                    ))
                })
        };
        let pw2 = pairwise(ADDITIVE_PAIRWISE_KEY)?;
        let pw3 = pairwise(NON_ADDITIVE_PAIRWISE_KEY)?;
        let e2: f64 = flatten_numbers(pw2)?.iter().sum();
        let e3: f64 = flatten_numbers(pw3)?.iter().sum();

        if !((e2 + e3 - ene).abs() < PAIRWISE_TOLERANCE) {
            return Err(HarnessError::ConsistencyViolation {
                two_body: e2,
                three_body: e3,
                energy: ene,
            });
        }

        calcinfo.insert("2-BODY DISPERSION CORRECTION ENERGY".to_string(), json!(e2));
        calcinfo.insert("3-BODY DISPERSION CORRECTION ENERGY".to_string(), json!(e3));
        calcinfo.insert(
            "2-BODY PAIRWISE DISPERSION CORRECTION ANALYSIS".to_string(),
            pw2.clone(),
        );
        calcinfo.insert(
            "3-BODY PAIRWISE DISPERSION CORRECTION ANALYSIS".to_string(),
            pw3.clone(),
        );
    }

    Ok(calcinfo)
}
