//! 控制台输出
//!
//! 面向运维人员的输出（阶段标题、✓/✗ 标记、表格），写到 stdout/stderr。
//! 诊断日志走 tracing，不经过这里。

use std::io::IsTerminal;
use std::sync::OnceLock;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

fn color_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| {
        std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
    })
}

fn paint(color: &str, text: &str) -> String {
    if color_enabled() {
        format!("{}{}{}", color, text, RESET)
    } else {
        text.to_string()
    }
}

/// 段落标题
pub fn header(title: &str) {
    println!();
    println!("{}", paint(BOLD, &format!("=== {} ===", title)));
}

/// 阶段进度，如 `[3/10] Checking ports...`
pub fn step(index: usize, total: usize, message: &str) {
    println!("{} {}", paint(BLUE, &format!("[{}/{}]", index, total)), message);
}

pub fn info(message: &str) {
    println!("{} {}", paint(BLUE, "[INFO]"), message);
}

pub fn success(message: &str) {
    println!("{} {}", paint(GREEN, "✓"), message);
}

pub fn warn(message: &str) {
    println!("{} {}", paint(YELLOW, "⚠"), message);
}

/// 失败标记，写到 stderr
pub fn error(message: &str) {
    eprintln!("{} {}", paint(RED, "✗"), message);
}

/// 带阶段标签的致命错误
pub fn fatal(stage: &str, message: &str) {
    eprintln!("{} {}", paint(RED, &format!("✗ [{}]", stage)), message);
}

/// 单项检查结果
pub fn check(label: &str, ok: bool, detail: &str) {
    if ok {
        success(&format!("{:<24} {}", label, detail));
    } else {
        error(&format!("{:<24} {}", label, detail));
    }
}

/// 子进程输出行
pub fn stream_line(line: &str) {
    println!("  {}", paint(DIM, line));
}

/// 原样输出多行文本（命令输出、日志片段）
pub fn block(text: &str) {
    for line in text.lines() {
        println!("  {}", line);
    }
}

/// 键值对输出
pub fn kv(key: &str, value: &str) {
    println!("  {:<18} {}", key, value);
}
