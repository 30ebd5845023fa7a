//! # 版本缓存
//!
//! 可执行文件路径 -> 规范化版本号。只增不删，生命周期与进程相同。
//! 同一路径并发查询时只会读取一次后端版本。
//!
//! ## 依赖关系
//! - 被 `harness/dftd4.rs` 使用

use crate::error::Result;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

static VCS_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:-\d+-g[0-9a-fA-F]+)?(?:[-.]dirty)?$").unwrap());

/// 版本缓存
#[derive(Debug, Default)]
pub struct VersionCache {
    entries: Mutex<HashMap<PathBuf, String>>,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 命中时直接返回；否则调用 `read` 并写入缓存。读取失败不写入。
    pub fn get_or_try_insert_with<F>(&self, path: &Path, read: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let mut entries = self.entries.lock();
        if let Some(version) = entries.get(path) {
            return Ok(version.clone());
        }
        let version = read()?;
        entries.insert(path.to_path_buf(), version.clone());
        Ok(version)
    }
}

/// 规范化版本号：去掉前缀 `v`、本地版本段 `+...` 与 git describe 后缀
pub fn normalize_version(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let public = trimmed.split('+').next().unwrap_or(trimmed);
    VCS_SUFFIX.replace(public, "").to_string()
}
