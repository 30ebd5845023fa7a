//! # 终端消息
//!
//! 面向用户的状态行、字段行和标题栏。诊断信息走 `tracing`，这里只负责
//! 人读的结果摘要；错误行写 stderr，其余写 stdout。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块和 `main.rs` 使用
//! - 使用 `colored` crate

use colored::{ColoredString, Colorize};

const RULE_WIDTH: usize = 60;
const FIELD_WIDTH: usize = 18;

/// 状态行的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Error,
    Warning,
    Info,
    Skip,
    Done,
}

impl Status {
    fn tag(self) -> &'static str {
        match self {
            Status::Ok => "[OK]",
            Status::Error => "[ERR]",
            Status::Warning => "[WARN]",
            Status::Info => "[*]",
            Status::Skip => "[SKIP]",
            Status::Done => "[DONE]",
        }
    }

    fn styled(self) -> ColoredString {
        let tag = self.tag();
        match self {
            Status::Ok | Status::Done => tag.green().bold(),
            Status::Error => tag.red().bold(),
            Status::Warning => tag.yellow().bold(),
            Status::Info => tag.blue().bold(),
            Status::Skip => tag.dimmed(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Status::Error)
    }
}

fn emit(status: Status, msg: &str) {
    let line = format!("{} {}", status.styled(), msg);
    if status.to_stderr() {
        eprintln!("{}", line);
    } else {
        println!("{}", line);
    }
}

fn field_label(key: &str) -> String {
    format!("{:<width$}", format!("{}:", key), width = FIELD_WIDTH)
}

pub fn print_success(msg: &str) {
    emit(Status::Ok, msg);
}

pub fn print_error(msg: &str) {
    emit(Status::Error, msg);
}

pub fn print_warning(msg: &str) {
    emit(Status::Warning, msg);
}

pub fn print_info(msg: &str) {
    emit(Status::Info, msg);
}

pub fn print_skip(msg: &str) {
    emit(Status::Skip, msg);
}

pub fn print_done(msg: &str) {
    emit(Status::Done, msg);
}

/// 输入文件 -> 结果文件
pub fn print_written(input: &str, output: &str) {
    emit(Status::Ok, &format!("{} {} {}", input.dimmed(), "->".cyan(), output));
}

/// 缩进的 `key: value` 行，键名左对齐
pub fn print_field(key: &str, value: &str) {
    println!("  {} {}", field_label(key).bold(), value);
}

pub fn print_header(title: &str) {
    let rule = "─".repeat(RULE_WIDTH);
    println!("\n{}\n  {}\n{}\n", rule.dimmed(), title.bold(), rule.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_errors_go_to_stderr() {
        let all = [
            Status::Ok,
            Status::Error,
            Status::Warning,
            Status::Info,
            Status::Skip,
            Status::Done,
        ];
        let stderr: Vec<_> = all.iter().filter(|s| s.to_stderr()).collect();
        assert_eq!(stderr, vec![&Status::Error]);
        assert_eq!(Status::Skip.tag(), "[SKIP]");
        assert_eq!(Status::Info.tag(), "[*]");
    }

    #[test]
    fn test_field_label_padding() {
        assert_eq!(field_label("dftd4"), format!("{:<18}", "dftd4:"));
        assert_eq!(field_label("dftd4").len(), FIELD_WIDTH);
        // 超长键名不截断
        let long = "a".repeat(30);
        assert_eq!(field_label(&long), format!("{}:", long));
    }
}
