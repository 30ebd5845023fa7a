//! # 色散参数方案解析
//!
//! 将方法名、色散级别提示和参数微调解析为具体的参数方案 (`ResolvedPlan`)。
//! 输入无法解析时返回 `InvalidPlanInput`，由调用方决定是否吸收。
//!
//! ## 依赖关系
//! - 被 `harness/dftd4.rs` 使用
//! - 使用 `dispersion/aliases.rs`, `dispersion/dashcoeff.rs`

use super::aliases::{short_name, DispersionAliasTable};
use super::dashcoeff::DashCoeffTable;
use crate::error::{HarnessError, Result};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// 解析后的色散方案，存放在请求的 `extras.info` 中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    /// 规范色散级别标签
    pub dashlevel: String,

    /// 参数名 -> 数值
    pub dashparams: BTreeMap<String, f64>,

    /// 泛函 + 色散级别标签，如 `pbe-d4`；自定义参数时为空
    pub fctldash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashparams_citation: Option<String>,
}

/// 方案解析的输入
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanRequest<'a> {
    pub verbose: u8,
    pub name_hint: &'a str,
    pub level_hint: Option<&'a Value>,
    pub param_tweaks: Option<&'a Value>,
    pub dashcoeff_supplement: Option<&'a Value>,
}

/// 方案解析器接口
pub trait PlanResolver: Send + Sync {
    fn resolve(&self, request: &PlanRequest<'_>) -> Result<ResolvedPlan>;
}

/// 基于参数定义表的解析器
pub struct DashCoeffResolver {
    aliases: &'static DispersionAliasTable,
    table: DashCoeffTable,
}

impl Default for DashCoeffResolver {
    fn default() -> Self {
        DashCoeffResolver::new(DispersionAliasTable::builtin(), DashCoeffTable::builtin())
    }
}

impl DashCoeffResolver {
    pub fn new(aliases: &'static DispersionAliasTable, table: DashCoeffTable) -> Self {
        DashCoeffResolver { aliases, table }
    }

    /// 拆分 `fctl-level` 形式的名称；后缀不是已知级别时整个名称视为泛函
    fn split_name<'n>(&self, name: &'n str) -> (&'n str, Option<&'static str>) {
        if let Some(tag) = self.aliases.get(name) {
            return ("", Some(tag));
        }
        match name.rsplit_once('-') {
            Some((fctl, level)) => match self.aliases.get(level) {
                Some(tag) => (fctl, Some(tag)),
                None => (name, None),
            },
            None => (name, None),
        }
    }

    fn hinted_level(&self, level_hint: Option<&Value>) -> Result<Option<&'static str>> {
        let hint = match level_hint {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(HarnessError::InvalidPlanInput(format!(
                    "level_hint must be a string, got {}",
                    other
                )))
            }
        };
        self.aliases.get(hint).map(Some).ok_or_else(|| {
            HarnessError::InvalidPlanInput(format!("unknown dispersion level '{}'", hint))
        })
    }
}

impl PlanResolver for DashCoeffResolver {
    fn resolve(&self, request: &PlanRequest<'_>) -> Result<ResolvedPlan> {
        let supplemented;
        let table = match request.dashcoeff_supplement {
            Some(data) if !data.is_null() => {
                let mut table = self.table.clone();
                table.supplement(data, self.aliases)?;
                supplemented = table;
                &supplemented
            }
            _ => &self.table,
        };

        let name = request.name_hint.trim().to_lowercase();
        let (fctl, named_level) = self.split_name(&name);
        let hinted = self.hinted_level(request.level_hint)?;

        let dashlevel = match (named_level, hinted) {
            (Some(named), Some(hint)) if named != hint => {
                return Err(HarnessError::InvalidPlanInput(format!(
                    "method '{}' implies dispersion level '{}' but level_hint is '{}'",
                    name, named, hint
                )));
            }
            (Some(level), _) | (None, Some(level)) => level,
            (None, None) => {
                return Err(HarnessError::InvalidPlanInput(format!(
                    "cannot determine dispersion level for '{}'",
                    name
                )));
            }
        };

        let level = table.level(dashlevel).ok_or_else(|| {
            HarnessError::InvalidPlanInput(format!(
                "no parameters are known for dispersion level '{}'",
                dashlevel
            ))
        })?;

        let tweaks = request.param_tweaks.filter(|v| !v.is_null());

        let plan = if fctl.is_empty() {
            let tweaks = tweaks.ok_or_else(|| {
                HarnessError::InvalidPlanInput(
                    "neither a functional nor params_tweaks were given".to_string(),
                )
            })?;
            ResolvedPlan {
                dashlevel: dashlevel.to_string(),
                dashparams: level.complete_params(tweaks)?,
                fctldash: String::new(),
                dashparams_citation: None,
            }
        } else {
            let definition = level.definitions.get(fctl).ok_or_else(|| {
                HarnessError::InvalidPlanInput(format!(
                    "functional '{}' has no '{}' parameters",
                    fctl, dashlevel
                ))
            })?;
            let mut dashparams = definition.params.clone();
            if let Some(tweaks) = tweaks {
                dashparams.extend(level.complete_params(tweaks)?);
            }
            ResolvedPlan {
                dashlevel: dashlevel.to_string(),
                dashparams,
                fctldash: format!("{}-{}", fctl, short_name(dashlevel)),
                dashparams_citation: definition.citation.clone(),
            }
        };

        if request.verbose > 0 {
            debug!(
                dashlevel = %plan.dashlevel,
                fctldash = %plan.fctldash,
                params = ?plan.dashparams,
                "resolved dispersion plan"
            );
        }

        Ok(plan)
    }
}
