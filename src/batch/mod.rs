//! # 批量处理模块
//!
//! 对一个目录下的多个 QCSchema 输入并行执行计算。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）
//! - glob 模式收集输入文件
//! - rayon 线程池并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchRunner, ProcessResult};
