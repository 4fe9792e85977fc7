//! 交互式确认
//!
//! 破坏性操作前的确认与文件名输入都经过 `Prompter`，测试中用脚本化实现替代终端

use std::io::{BufRead, Write};

/// 交互输入能力
pub trait Prompter: Send + Sync {
    /// 显示提示并读取一行输入；输入结束（EOF）时返回 None
    fn ask(&self, prompt: &str) -> Option<String>;

    /// 需要键入 `yes` 才返回 true
    fn confirm(&self, prompt: &str) -> bool {
        self.ask(&format!("{} (type 'yes' to continue): ", prompt))
            .map(|answer| is_affirmative(&answer))
            .unwrap_or(false)
    }
}

/// 只接受 `yes`（忽略大小写和首尾空白）
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// 终端实现
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
        }
    }
}
