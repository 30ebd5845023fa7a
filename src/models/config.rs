//! # 任务运行配置
//!
//! 编排器传给 harness 的资源描述。本 harness 不做内部并行，
//! `ncores` 仅转交给后端进程的 OpenMP 线程数。
//!
//! ## 依赖关系
//! - 被 `harness/`, `backend/program.rs`, `commands/` 使用

use crate::error::{HarnessError, Result};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 任务配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// 可用核数
    pub ncores: usize,

    /// 可用节点数
    pub nnodes: usize,

    /// 可用内存 (GiB)
    pub memory: f64,

    /// 后端工作文件的父目录，缺省为系统临时目录
    #[serde(default)]
    pub scratch_directory: Option<PathBuf>,

    /// 失败重试次数，本 harness 不重试
    #[serde(default)]
    pub retries: u32,
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            ncores: 1,
            nnodes: 1,
            memory: 2.0,
            scratch_directory: None,
            retries: 0,
        }
    }
}

impl TaskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ncores == 0 {
            return Err(HarnessError::InvalidArgument(
                "ncores must be at least 1".to_string(),
            ));
        }
        if self.nnodes == 0 {
            return Err(HarnessError::InvalidArgument(
                "nnodes must be at least 1".to_string(),
            ));
        }
        if !(self.memory > 0.0) {
            return Err(HarnessError::InvalidArgument(format!(
                "memory must be positive, got {}",
                self.memory
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TaskConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_cores_rejected() {
        let config = TaskConfig {
            ncores: 0,
            ..TaskConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
