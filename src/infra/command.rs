//! 命令执行器
//!
//! 提供统一的命令执行接口，支持：
//! - 实时输出转发到控制台
//! - 超时控制
//! - 交互式会话（继承终端）
//! - stdout 重定向到文件 / stdin 从文件读取

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error};

use crate::console;

/// 命令执行器
pub struct CommandRunner;

/// 命令执行错误
#[derive(Debug)]
pub enum CommandError {
    /// 命令启动失败
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },
    /// 命令超时
    Timeout { program: String },
    /// 命令以非零状态退出
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// 重定向文件读写失败
    Io(std::io::Error),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::SpawnFailed { program, source } => {
                write!(f, "Failed to spawn {}: {}", program, source)
            }
            CommandError::Timeout { program } => write!(f, "{} timed out", program),
            CommandError::Failed { program, code, stderr } => {
                write!(f, "{} exited with {:?}: {}", program, code, stderr.trim())
            }
            CommandError::Io(e) => write!(f, "Redirect failed: {}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::SpawnFailed { source, .. } => Some(source),
            CommandError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 环境变量对
pub type EnvPair = (String, String);

fn build<S: AsRef<OsStr>>(program: &str, args: &[S], work_dir: &Path, envs: &[EnvPair]) -> Command {
    let mut cmd = Command::new(program);
    // 超时分支丢弃 future 时子进程随之结束
    cmd.args(args).current_dir(work_dir).kill_on_drop(true);
    for (k, v) in envs {
        cmd.env(k, v);
    }
    cmd
}

fn describe<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

fn check_status(program: &str, status: ExitStatus, stderr: String) -> Result<(), CommandError> {
    if status.success() {
        Ok(())
    } else {
        Err(CommandError::Failed {
            program: program.to_string(),
            code: status.code(),
            stderr,
        })
    }
}

impl CommandRunner {
    /// 执行简单命令（无流式输出），返回原始输出
    ///
    /// 非零退出码不视为错误，由调用方检查 `status`
    pub async fn run_simple<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
        timeout: Duration,
    ) -> Result<Output, CommandError> {
        debug!(command = %describe(program, args), "Running command");
        let child = build(program, args, work_dir, envs)
            .stdin(Stdio::null())
            .output();

        tokio::select! {
            result = child => {
                result.map_err(|source| CommandError::SpawnFailed {
                    program: program.to_string(),
                    source,
                })
            }
            _ = tokio::time::sleep(timeout) => {
                Err(CommandError::Timeout { program: program.to_string() })
            }
        }
    }

    /// 执行命令并要求成功，返回 stdout
    pub async fn run_checked<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
        timeout: Duration,
    ) -> Result<String, CommandError> {
        let output = Self::run_simple(program, args, work_dir, envs, timeout).await?;
        check_status(
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).to_string(),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// 执行命令并把输出逐行转发到控制台
    ///
    /// 用于 compose up / build 这类需要实时进度的长命令
    pub async fn run_streaming<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
        timeout: Duration,
    ) -> Result<(), CommandError> {
        debug!(command = %describe(program, args), "Running streaming command");
        let mut child = build(program, args, work_dir, envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::SpawnFailed {
                program: program.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_task = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    console::stream_line(&line);
                }
            }
        });

        // compose 的进度信息写到 stderr，保留最后几行用于错误报告
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    console::stream_line(&line);
                    tail.push(line);
                    if tail.len() > 20 {
                        tail.remove(0);
                    }
                }
            }
            tail.join("\n")
        });

        let status = tokio::select! {
            _ = tokio::time::sleep(timeout) => {
                error!("{} timed out after {:?}", program, timeout);
                let _ = child.kill().await;
                let _ = stdout_task.await;
                let _ = stderr_task.await;
                return Err(CommandError::Timeout { program: program.to_string() });
            }
            status = child.wait() => status.map_err(CommandError::Io)?,
        };

        let _ = stdout_task.await;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        check_status(program, status, stderr_tail)
    }

    /// 执行交互式命令，继承当前终端的 stdin/stdout/stderr
    ///
    /// 用于 shell、psql、logs -f 等场景，没有超时
    pub async fn run_interactive<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
    ) -> Result<ExitStatus, CommandError> {
        debug!(command = %describe(program, args), "Running interactive command");
        build(program, args, work_dir, envs)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| CommandError::SpawnFailed {
                program: program.to_string(),
                source,
            })
    }

    /// 执行命令并把 stdout 写入文件
    pub async fn run_to_file<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
        dest: &Path,
        timeout: Duration,
    ) -> Result<(), CommandError> {
        debug!(command = %describe(program, args), dest = %dest.display(), "Running command to file");
        let file = std::fs::File::create(dest).map_err(CommandError::Io)?;

        let child = build(program, args, work_dir, envs)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .output();

        let output = tokio::select! {
            result = child => result.map_err(|source| CommandError::SpawnFailed {
                program: program.to_string(),
                source,
            })?,
            _ = tokio::time::sleep(timeout) => {
                return Err(CommandError::Timeout { program: program.to_string() });
            }
        };

        check_status(
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    /// 执行命令并从文件读取 stdin
    pub async fn run_from_file<S: AsRef<OsStr>>(
        program: &str,
        args: &[S],
        work_dir: &Path,
        envs: &[EnvPair],
        src: &Path,
        timeout: Duration,
    ) -> Result<String, CommandError> {
        debug!(command = %describe(program, args), src = %src.display(), "Running command from file");
        let file = std::fs::File::open(src).map_err(CommandError::Io)?;

        let child = build(program, args, work_dir, envs)
            .stdin(Stdio::from(file))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::select! {
            result = child => result.map_err(|source| CommandError::SpawnFailed {
                program: program.to_string(),
                source,
            })?,
            _ = tokio::time::sleep(timeout) => {
                return Err(CommandError::Timeout { program: program.to_string() });
            }
        };

        check_status(
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).to_string(),
        )?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// 检查命令是否在 PATH 中
    pub async fn exists(program: &str) -> bool {
        Command::new("sh")
            .args(["-c", &format!("command -v {} >/dev/null 2>&1", program)])
            .stdin(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}
