//! # 批量执行器
//!
//! 并行执行批量计算任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/batch.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{HarnessError, Result};
use crate::utils::progress;

use rayon::prelude::*;

/// 单个任务处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult<T> {
    Success(T),
    /// 跳过的输入（如结果已存在）
    Skipped(String),
    /// (文件路径, 错误信息)
    Failed(String, String),
}

/// 批量处理结果统计
#[derive(Debug)]
pub struct BatchResult<T> {
    /// 成功项，按输入顺序
    pub successes: Vec<T>,
    pub skipped: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl<T> Default for BatchResult<T> {
    fn default() -> Self {
        BatchResult {
            successes: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BatchResult<T> {
    pub fn merge(&mut self, result: ProcessResult<T>) {
        match result {
            ProcessResult::Success(item) => self.successes.push(item),
            ProcessResult::Skipped(item) => self.skipped.push(item),
            ProcessResult::Failed(path, err) => self.failures.push((path, err)),
        }
    }

    pub fn success(&self) -> usize {
        self.successes.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.success() + self.skipped.len() + self.failed()
    }
}

/// 批量执行器
pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部 CPU
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理任务列表，结果保持输入顺序
    pub fn run<I, T, F>(&self, items: &[I], processor: F) -> Result<BatchResult<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> ProcessResult<T> + Sync + Send,
    {
        let pb = progress::create_progress_bar(items.len() as u64, "Computing");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| HarnessError::Other(format!("failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult<T>> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = processor(item);
                    if let ProcessResult::Failed(path, err) = &result {
                        pb.suspend(|| tracing::warn!(path = %path, error = %err, "input failed"));
                    }
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }

        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_run_collects_in_order() {
        let files: Vec<PathBuf> = (0..6).map(|i| PathBuf::from(format!("{}.json", i))).collect();
        let runner = BatchRunner::new(3);
        let result = runner
            .run(&files, |path| {
                let stem = path.file_stem().unwrap().to_string_lossy().to_string();
                match stem.parse::<usize>().unwrap() {
                    1 => ProcessResult::Skipped(stem),
                    4 => ProcessResult::Failed(stem, "boom".into()),
                    n => ProcessResult::Success(n),
                }
            })
            .unwrap();

        assert_eq!(result.successes, vec![0, 2, 3, 5]);
        assert_eq!(result.skipped, vec!["1".to_string()]);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.total(), 6);
        assert_eq!(result.failures[0].1, "boom");
    }

    #[test]
    fn test_zero_jobs_uses_all_cpus() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
    }
}
