//! # QCSchema 数据模型
//!
//! 定义单点计算的请求 (`AtomicInput`) 与结果 (`AtomicResult`)。
//! 反序列化后通过 `validate()` 检查结构完整性。
//!
//! ## 依赖关系
//! - 被 `harness/dftd4.rs`, `backend/program.rs`, `commands/` 使用
//! - 无外部模块依赖

use crate::error::{HarnessError, Result};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 任意 JSON 键值映射（keywords / extras）
pub type JsonMap = Map<String, Value>;

pub const INPUT_SCHEMA_NAME: &str = "qcschema_input";
pub const OUTPUT_SCHEMA_NAME: &str = "qcschema_output";
pub const SCHEMA_VERSION: u32 = 1;

fn input_schema_name() -> String {
    INPUT_SCHEMA_NAME.to_string()
}

fn output_schema_name() -> String {
    OUTPUT_SCHEMA_NAME.to_string()
}

fn schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_multiplicity() -> u32 {
    1
}

/// 计算类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Energy,
    Gradient,
    Hessian,
    Properties,
}

impl std::fmt::Display for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Driver::Energy => write!(f, "energy"),
            Driver::Gradient => write!(f, "gradient"),
            Driver::Hessian => write!(f, "hessian"),
            Driver::Properties => write!(f, "properties"),
        }
    }
}

/// 计算方法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// 方法名，可能带有 `d4-` 引擎前缀或色散级别后缀
    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

impl Model {
    pub fn new(method: impl Into<String>) -> Self {
        Model {
            method: method.into(),
            basis: None,
        }
    }
}

/// 分子结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    /// 元素符号
    pub symbols: Vec<String>,

    /// 笛卡尔坐标 (bohr)，展平为 3 * natom
    pub geometry: Vec<f64>,

    #[serde(default)]
    pub molecular_charge: f64,

    #[serde(default = "default_multiplicity")]
    pub molecular_multiplicity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// 其余未建模字段原样保留
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Molecule {
    pub fn new(symbols: Vec<String>, geometry: Vec<f64>) -> Self {
        Molecule {
            symbols,
            geometry,
            molecular_charge: 0.0,
            molecular_multiplicity: 1,
            name: None,
            extra: JsonMap::new(),
        }
    }

    /// 原子数
    pub fn natom(&self) -> usize {
        self.symbols.len()
    }

    /// 第 i 个原子的坐标 (bohr)
    pub fn position(&self, i: usize) -> [f64; 3] {
        [
            self.geometry[3 * i],
            self.geometry[3 * i + 1],
            self.geometry[3 * i + 2],
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(HarnessError::SchemaValidation(
                "molecule has no atoms".to_string(),
            ));
        }
        if self.geometry.len() != 3 * self.symbols.len() {
            return Err(HarnessError::SchemaValidation(format!(
                "geometry has {} values, expected {} for {} atoms",
                self.geometry.len(),
                3 * self.symbols.len(),
                self.symbols.len()
            )));
        }
        if self.geometry.iter().any(|x| !x.is_finite()) {
            return Err(HarnessError::SchemaValidation(
                "geometry contains non-finite values".to_string(),
            ));
        }
        if self.molecular_multiplicity == 0 {
            return Err(HarnessError::SchemaValidation(
                "molecular_multiplicity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// 计算请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicInput {
    #[serde(default = "input_schema_name")]
    pub schema_name: String,

    #[serde(default = "schema_version")]
    pub schema_version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub molecule: Molecule,

    pub driver: Driver,

    pub model: Model,

    #[serde(default)]
    pub keywords: JsonMap,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub protocols: Value,

    #[serde(default)]
    pub extras: JsonMap,
}

impl AtomicInput {
    pub fn new(molecule: Molecule, driver: Driver, model: Model) -> Self {
        AtomicInput {
            schema_name: input_schema_name(),
            schema_version: SCHEMA_VERSION,
            id: None,
            molecule,
            driver,
            model,
            keywords: JsonMap::new(),
            protocols: Value::Null,
            extras: JsonMap::new(),
        }
    }

    /// 从 JSON 文本解析并校验
    pub fn from_json_str(text: &str) -> Result<Self> {
        let input: AtomicInput = serde_json::from_str(text)?;
        input.validate()?;
        Ok(input)
    }

    /// 设置关键字（构建用）
    pub fn with_keyword(mut self, key: &str, value: Value) -> Self {
        self.keywords.insert(key.to_string(), value);
        self
    }

    /// 读取非 null 关键字
    pub fn keyword(&self, key: &str) -> Option<&Value> {
        self.keywords.get(key).filter(|v| !v.is_null())
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_name != INPUT_SCHEMA_NAME {
            return Err(HarnessError::SchemaValidation(format!(
                "unexpected schema_name '{}', expected '{}'",
                self.schema_name, INPUT_SCHEMA_NAME
            )));
        }
        if self.schema_version != SCHEMA_VERSION {
            return Err(HarnessError::SchemaValidation(format!(
                "unsupported schema_version {}",
                self.schema_version
            )));
        }
        self.molecule.validate()
    }
}

/// 计算结果中的标量性质
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomicResultProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_energy: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calcinfo_natom: Option<usize>,
}

/// 程序来源信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub creator: String,
    pub version: String,
    pub routine: String,
}

/// 计算结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicResult {
    #[serde(default = "output_schema_name")]
    pub schema_name: String,

    #[serde(default = "schema_version")]
    pub schema_version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub molecule: Molecule,

    pub driver: Driver,

    pub model: Model,

    #[serde(default)]
    pub keywords: JsonMap,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub protocols: Value,

    #[serde(default)]
    pub extras: JsonMap,

    #[serde(default)]
    pub properties: AtomicResultProperties,

    /// energy 时为标量，gradient 时为展平数组
    pub return_result: Value,

    pub success: bool,

    pub provenance: Provenance,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
}

impl AtomicResult {
    /// 以请求的身份字段构建结果
    pub fn from_input(
        input: &AtomicInput,
        properties: AtomicResultProperties,
        return_result: Value,
        provenance: Provenance,
    ) -> Self {
        AtomicResult {
            schema_name: output_schema_name(),
            schema_version: SCHEMA_VERSION,
            id: input.id.clone(),
            molecule: input.molecule.clone(),
            driver: input.driver,
            model: input.model.clone(),
            keywords: input.keywords.clone(),
            protocols: input.protocols.clone(),
            extras: JsonMap::new(),
            properties,
            return_result,
            success: true,
            provenance,
            stdout: None,
        }
    }

    /// 返回能量，缺失时视为结构错误
    pub fn return_energy(&self) -> Result<f64> {
        self.properties.return_energy.ok_or_else(|| {
            HarnessError::SchemaValidation("result has no properties.return_energy".to_string())
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_name != OUTPUT_SCHEMA_NAME {
            return Err(HarnessError::SchemaValidation(format!(
                "unexpected schema_name '{}', expected '{}'",
                self.schema_name, OUTPUT_SCHEMA_NAME
            )));
        }
        self.molecule.validate()?;

        match self.driver {
            Driver::Energy => {
                if !self.return_result.is_number() {
                    return Err(HarnessError::SchemaValidation(
                        "energy result must be a number".to_string(),
                    ));
                }
            }
            Driver::Gradient => {
                let expected = 3 * self.molecule.natom();
                let ok = self
                    .return_result
                    .as_array()
                    .map(|a| a.len() == expected && a.iter().all(Value::is_number))
                    .unwrap_or(false);
                if !ok {
                    return Err(HarnessError::SchemaValidation(format!(
                        "gradient result must be an array of {} numbers",
                        expected
                    )));
                }
            }
            Driver::Hessian | Driver::Properties => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn water() -> Molecule {
        Molecule::new(
            vec!["O".into(), "H".into(), "H".into()],
            vec![0.0, 0.0, -0.13, 0.0, -1.49, 1.03, 0.0, 1.49, 1.03],
        )
    }

    #[test]
    fn test_input_defaults_from_json() {
        let text = r#"{
            "molecule": {"symbols": ["He", "He"], "geometry": [0, 0, 0, 0, 0, 5.6]},
            "driver": "energy",
            "model": {"method": "d4-pbe"}
        }"#;
        let input = AtomicInput::from_json_str(text).unwrap();
        assert_eq!(input.schema_name, INPUT_SCHEMA_NAME);
        assert_eq!(input.schema_version, 1);
        assert_eq!(input.driver, Driver::Energy);
        assert_eq!(input.molecule.molecular_multiplicity, 1);
        assert!(input.keywords.is_empty());
        assert!(input.extras.is_empty());
    }

    #[test]
    fn test_molecule_geometry_length_checked() {
        let mut mol = water();
        mol.geometry.pop();
        assert!(matches!(
            mol.validate(),
            Err(HarnessError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_molecule_unknown_fields_preserved() {
        let value = json!({
            "symbols": ["Ne"],
            "geometry": [0.0, 0.0, 0.0],
            "fix_com": true
        });
        let mol: Molecule = serde_json::from_value(value).unwrap();
        assert_eq!(mol.extra.get("fix_com"), Some(&json!(true)));
        let back = serde_json::to_value(&mol).unwrap();
        assert_eq!(back["fix_com"], json!(true));
    }

    #[test]
    fn test_keyword_null_treated_as_absent() {
        let input = AtomicInput::new(water(), Driver::Energy, Model::new("pbe"))
            .with_keyword("level_hint", Value::Null)
            .with_keyword("pair_resolved", json!(true));
        assert!(input.keyword("level_hint").is_none());
        assert_eq!(input.keyword("pair_resolved"), Some(&json!(true)));
    }

    #[test]
    fn test_gradient_result_shape_validated() {
        let input = AtomicInput::new(water(), Driver::Gradient, Model::new("pbe"));
        let provenance = Provenance {
            creator: "dftd4".into(),
            version: "3.6.0".into(),
            routine: "test".into(),
        };
        let props = AtomicResultProperties {
            return_energy: Some(-1e-4),
            calcinfo_natom: Some(3),
        };

        let good = AtomicResult::from_input(&input, props.clone(), json!(vec![0.0; 9]), provenance.clone());
        assert!(good.validate().is_ok());

        let bad = AtomicResult::from_input(&input, props, json!(vec![0.0; 6]), provenance);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_result_mirrors_identity() {
        let mut input = AtomicInput::new(water(), Driver::Energy, Model::new("pbe"));
        input.id = Some("job-7".into());
        let result = AtomicResult::from_input(
            &input,
            AtomicResultProperties::default(),
            json!(0.0),
            Provenance {
                creator: "dftd4".into(),
                version: "3.6.0".into(),
                routine: "test".into(),
            },
        );
        assert_eq!(result.id.as_deref(), Some("job-7"));
        assert_eq!(result.model, input.model);
        assert!(result.return_energy().is_err());
    }
}
