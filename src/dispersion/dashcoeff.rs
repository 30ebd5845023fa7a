//! # 色散参数定义表
//!
//! 每个色散级别的参数名、默认值，以及按泛函命名的参数集。
//! 内置表只包含 D4(BJ) 参数；其他级别可通过 `dashcoeff_supplement` 补充。
//!
//! ## 依赖关系
//! - 被 `dispersion/plan.rs` 使用
//! - 使用 `dispersion/aliases.rs` 解析补充数据中的级别名

use super::aliases::{DispersionAliasTable, D4BJ};
use crate::error::{HarnessError, Result};

use serde_json::Value;
use std::collections::BTreeMap;

/// D4(BJ) 参数的文献来源
const D4_CITATION: &str = "E. Caldeweyher, S. Ehlert, A. Hansen, H. Neugebauer, S. Spicher, \
C. Bannwarth, S. Grimme, J. Chem. Phys. 150, 154122 (2019)";

/// 单个泛函的参数集
#[derive(Debug, Clone, PartialEq)]
pub struct DashDefinition {
    pub params: BTreeMap<String, f64>,
    pub citation: Option<String>,
}

/// 单个色散级别
#[derive(Debug, Clone, PartialEq)]
pub struct DashLevel {
    /// 定义性参数名
    pub param_names: Vec<&'static str>,
    /// 可省略参数的默认值
    pub defaults: BTreeMap<&'static str, f64>,
    /// 泛函 -> 参数集
    pub definitions: BTreeMap<String, DashDefinition>,
}

impl DashLevel {
    fn new(param_names: &[&'static str], defaults: &[(&'static str, f64)]) -> Self {
        DashLevel {
            param_names: param_names.to_vec(),
            defaults: defaults.iter().copied().collect(),
            definitions: BTreeMap::new(),
        }
    }

    /// 用默认值补全参数，并检查多余/缺失的参数名
    pub fn complete_params(&self, given: &Value) -> Result<BTreeMap<String, f64>> {
        let obj = given.as_object().ok_or_else(|| {
            HarnessError::InvalidPlanInput(format!(
                "dispersion parameters must be an object, got {}",
                given
            ))
        })?;

        let mut params = BTreeMap::new();
        for (key, value) in obj {
            let key = key.to_lowercase();
            if !self.param_names.iter().any(|name| *name == key) {
                return Err(HarnessError::InvalidPlanInput(format!(
                    "unrecognized dispersion parameter '{}', expected one of {:?}",
                    key, self.param_names
                )));
            }
            let value = value.as_f64().ok_or_else(|| {
                HarnessError::InvalidPlanInput(format!(
                    "dispersion parameter '{}' is not a number: {}",
                    key, value
                ))
            })?;
            params.insert(key, value);
        }

        for name in &self.param_names {
            if params.contains_key(*name) {
                continue;
            }
            match self.defaults.get(name) {
                Some(default) => {
                    params.insert(name.to_string(), *default);
                }
                None => {
                    return Err(HarnessError::InvalidPlanInput(format!(
                        "missing dispersion parameter '{}'",
                        name
                    )));
                }
            }
        }

        Ok(params)
    }
}

/// 全部色散级别
#[derive(Debug, Clone, PartialEq)]
pub struct DashCoeffTable {
    levels: BTreeMap<String, DashLevel>,
}

impl DashCoeffTable {
    /// 内置参数表
    pub fn builtin() -> Self {
        let mut levels = BTreeMap::new();

        levels.insert(
            "d2".to_string(),
            DashLevel::new(&["s6", "alpha6", "sr6"], &[("alpha6", 20.0), ("sr6", 1.1)]),
        );
        levels.insert(
            "d3zero2b".to_string(),
            DashLevel::new(
                &["s6", "s8", "sr6", "sr8", "alpha6"],
                &[("s6", 1.0), ("sr8", 1.0), ("alpha6", 14.0)],
            ),
        );
        levels.insert(
            "d3bj2b".to_string(),
            DashLevel::new(&["s6", "s8", "a1", "a2"], &[("s6", 1.0)]),
        );
        levels.insert(
            "d3mzero2b".to_string(),
            DashLevel::new(
                &["s6", "s8", "sr6", "beta", "alpha6"],
                &[("s6", 1.0), ("alpha6", 14.0)],
            ),
        );
        levels.insert(
            "d3mbj2b".to_string(),
            DashLevel::new(&["s6", "s8", "a1", "a2"], &[("s6", 1.0)]),
        );

        let mut d4 = DashLevel::new(&["s6", "s8", "a1", "a2", "s9"], &[("s6", 1.0), ("s9", 1.0)]);
        for (fctl, s8, a1, a2) in D4BJ_PARAMS {
            let params = [("s6", 1.0), ("s8", *s8), ("a1", *a1), ("a2", *a2), ("s9", 1.0)]
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect();
            d4.definitions.insert(
                fctl.to_string(),
                DashDefinition {
                    params,
                    citation: Some(D4_CITATION.to_string()),
                },
            );
        }
        levels.insert(D4BJ.to_string(), d4);

        DashCoeffTable { levels }
    }

    pub fn level(&self, tag: &str) -> Option<&DashLevel> {
        self.levels.get(tag)
    }

    /// 合并用户补充的参数定义
    ///
    /// 格式: `{"<level>": {"definitions": {"<fctl>": {"params": {...}, "citation": "..."}}}}`
    pub fn supplement(&mut self, data: &Value, aliases: &DispersionAliasTable) -> Result<()> {
        let obj = data.as_object().ok_or_else(|| {
            HarnessError::InvalidPlanInput("dashcoeff_supplement must be an object".to_string())
        })?;

        for (level_name, level_data) in obj {
            let tag = aliases.get(level_name).ok_or_else(|| {
                HarnessError::InvalidPlanInput(format!(
                    "unknown dispersion level '{}' in dashcoeff_supplement",
                    level_name
                ))
            })?;
            let level = self.levels.get_mut(tag).ok_or_else(|| {
                HarnessError::InvalidPlanInput(format!(
                    "dispersion level '{}' has no parameter layout",
                    tag
                ))
            })?;

            let definitions = level_data
                .get("definitions")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    HarnessError::InvalidPlanInput(format!(
                        "dashcoeff_supplement['{}'] lacks a 'definitions' object",
                        level_name
                    ))
                })?;

            for (fctl, def) in definitions {
                let params_value = def.get("params").ok_or_else(|| {
                    HarnessError::InvalidPlanInput(format!(
                        "supplement definition '{}' lacks 'params'",
                        fctl
                    ))
                })?;
                let params = level.complete_params(params_value)?;
                let citation = def
                    .get("citation")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                level
                    .definitions
                    .insert(fctl.to_lowercase(), DashDefinition { params, citation });
            }
        }

        Ok(())
    }
}

/// D4(BJ) 参数: (泛函, s8, a1, a2)，s6 = s9 = 1
const D4BJ_PARAMS: &[(&str, f64, f64, f64)] = &[
    ("b1lyp", 1.98553711, 0.39309794, 4.55465080),
    ("b3lyp", 2.02929367, 0.40868035, 4.53807137),
    ("b3pw91", 2.83844209, 0.46885939, 4.71232290),
    ("blyp", 2.34076671, 0.44488865, 4.09330090),
    ("bp86", 3.35497927, 0.43645861, 4.92406854),
    ("hf", 1.61679827, 0.44959224, 3.35743605),
    ("pbe", 0.95948085, 0.38574991, 4.80688534),
    ("pbe0", 1.20065498, 0.40085597, 5.02928789),
    ("pw6b95", -0.31629935, 0.03999357, 5.83690254),
    ("revpbe", 1.74676530, 0.53634900, 3.07261485),
    ("scan", 1.46126056, 0.62930855, 6.31284039),
    ("tpss", 1.76596355, 0.42822303, 4.54257102),
    ("tpssh", 1.85897750, 0.44286966, 4.60230534),
];
