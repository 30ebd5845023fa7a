//! # 数据模型模块
//!
//! 定义 QCSchema 输入/输出数据模型和运行时任务配置。
//!
//! ## 依赖关系
//! - 被 `harness/`, `backend/`, `commands/` 使用
//! - 子模块: schema, config

pub mod config;
pub mod schema;

pub use config::TaskConfig;
pub use schema::{AtomicInput, AtomicResult, AtomicResultProperties, Driver, JsonMap, Provenance};
