//! # 统一错误处理模块
//!
//! 定义 qcdisp 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - `MissingDependency`: 后端程序未安装，始终携带修复提示
//! - `InvalidPlanInput`: 参数方案解析的输入错误，唯一可在 harness 内部吸收的错误
//! - `SchemaValidation`: 请求/结果结构校验失败，原样向上传递
//! - `ConsistencyViolation`: 成对能量之和与总能量不一致，致命错误
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// qcdisp 统一错误类型
#[derive(Error, Debug)]
pub enum HarnessError {
    // ─────────────────────────────────────────────────────────────
    // 后端可用性
    // ─────────────────────────────────────────────────────────────
    #[error("Program '{name}' could not be found. {hint}")]
    MissingDependency { name: String, hint: String },

    // ─────────────────────────────────────────────────────────────
    // 输入/输出结构
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid dispersion plan input: {0}")]
    InvalidPlanInput(String),

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Pairwise dispersion energies disagree with total: {two_body} + {three_body} != {energy}")]
    ConsistencyViolation {
        two_body: f64,
        three_body: f64,
        energy: f64,
    },

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

impl HarnessError {
    /// 是否为可在方案解析阶段吸收的输入错误
    pub fn is_invalid_plan_input(&self) -> bool {
        matches!(self, HarnessError::InvalidPlanInput(_))
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dependency_carries_hint() {
        let err = HarnessError::MissingDependency {
            name: "dftd4".to_string(),
            hint: "Please install dftd4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("dftd4"));
        assert!(msg.contains("Please install dftd4"));
    }

    #[test]
    fn test_only_plan_input_is_recoverable() {
        assert!(HarnessError::InvalidPlanInput("x".into()).is_invalid_plan_input());
        assert!(!HarnessError::SchemaValidation("x".into()).is_invalid_plan_input());
        assert!(!HarnessError::Other("x".into()).is_invalid_plan_input());
    }
}
