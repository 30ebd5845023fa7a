//! # 可执行程序查找
//!
//! 在显式路径或 `PATH` 中查找外部程序。每次调用都重新检查文件系统。
//!
//! ## 依赖关系
//! - 被 `backend/program.rs` 使用
//! - 无外部模块依赖

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// 查找程序：显式路径优先，其次搜索 `PATH`
pub fn locate_program(explicit: Option<&Path>, program: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return is_executable(path).then(|| path.to_path_buf());
    }
    find_in_path(program, env::var_os("PATH").as_deref())
}

/// 在给定的 PATH 字符串中搜索程序
pub fn find_in_path(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidates(&dir, program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program), dir.join(format!("{}.exe", program))]
}

#[cfg(not(windows))]
fn candidates(dir: &Path, program: &str) -> Vec<PathBuf> {
    vec![dir.join(program)]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[cfg(unix)]
    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_missing_program_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path_var = env::join_paths([dir.path()]).unwrap();
        assert!(find_in_path("definitely-not-dftd4", Some(&path_var)).is_none());
        assert!(find_in_path("dftd4", None).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_program_found_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("dftd4");
        make_executable(&exe);

        let path_var =
            env::join_paths([PathBuf::from("/nonexistent-qcdisp"), dir.path().to_path_buf()]).unwrap();
        assert_eq!(find_in_path("dftd4", Some(&path_var)), Some(exe.clone()));
        assert_eq!(locate_program(Some(&exe), "ignored"), Some(exe));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("dftd4"), "data").unwrap();
        let path_var = env::join_paths([dir.path()]).unwrap();
        assert!(find_in_path("dftd4", Some(&path_var)).is_none());
        assert!(locate_program(Some(&dir.path().join("dftd4")), "dftd4").is_none());
    }
}
