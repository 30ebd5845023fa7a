//! # 色散校正资源模块
//!
//! 色散级别别名、参数定义表，以及方法名到参数方案的解析。
//!
//! ## 依赖关系
//! - 被 `harness/` 使用
//! - 子模块: aliases, dashcoeff, plan

pub mod aliases;
pub mod dashcoeff;
pub mod plan;

pub use aliases::{DispersionAliasTable, D4BJ, D4_SHORT};
pub use dashcoeff::DashCoeffTable;
pub use plan::{DashCoeffResolver, PlanRequest, PlanResolver, ResolvedPlan};
