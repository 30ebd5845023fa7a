//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的 QCSchema 输入文件。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{HarnessError, Result};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    recursive: bool,
    /// 排除已生成的结果文件
    exclude_suffix: Option<String>,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
            exclude_suffix: None,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    HarnessError::InvalidArgument(format!("invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 跳过以该后缀结尾的文件
    pub fn exclude_suffix(mut self, suffix: &str) -> Self {
        self.exclude_suffix = Some(suffix.to_string());
        self
    }

    /// 收集所有匹配的文件（按路径排序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(HarnessError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(HarnessError::NoFilesFound {
                pattern: self.describe_patterns(),
            });
        }

        Ok(files)
    }

    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        if let Some(suffix) = &self.exclude_suffix {
            if filename.ends_with(suffix.as_str()) {
                return false;
            }
        }

        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(filename))
    }

    fn describe_patterns(&self) -> String {
        if self.patterns.is_empty() {
            return format!("{}/*", self.input.display());
        }
        let joined: Vec<&str> = self.patterns.iter().map(Pattern::as_str).collect();
        format!("{}/{}", self.input.display(), joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scratch() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        for file in ["a.json", "b.json", "a.out.json", "notes.txt", "nested/c.json"] {
            fs::write(dir.path().join(file), "{}").unwrap();
        }
        dir
    }

    #[test]
    fn test_collect_flat_with_exclusion() {
        let dir = scratch();
        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.json")
            .unwrap()
            .exclude_suffix(".out.json")
            .collect()
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_collect_recursive_multi_pattern() {
        let dir = scratch();
        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("c.json, *.txt")
            .unwrap()
            .recursive(true)
            .collect()
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_single_file_and_missing_dir() {
        let dir = scratch();
        let single = dir.path().join("a.json");
        assert_eq!(FileCollector::new(single.clone()).collect().unwrap(), vec![single]);

        let missing = FileCollector::new(dir.path().join("absent")).collect();
        assert!(matches!(missing, Err(HarnessError::DirectoryNotFound { .. })));

        let none = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("*.xyz")
            .unwrap()
            .collect();
        assert!(matches!(none, Err(HarnessError::NoFilesFound { .. })));
    }

    #[test]
    fn test_invalid_pattern() {
        let result = FileCollector::new(PathBuf::from(".")).with_pattern("[");
        assert!(matches!(result, Err(HarnessError::InvalidArgument(_))));
    }
}
