//! 统一错误处理
//!
//! 提供 `OpsError` 枚举，覆盖部署与管理命令的所有致命错误，并映射到进程退出码

use thiserror::Error;

use crate::infra::command::CommandError;

/// 统一错误类型
#[derive(Debug, Error)]
pub enum OpsError {
    /// 宿主环境不匹配（平台签名错误）
    #[error("unsupported host environment: {0}")]
    Environment(String),

    /// 依赖工具缺失且无法安装
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// 端口已被占用
    #[error("port {port} ({purpose}) is already in use")]
    PortInUse { port: u16, purpose: &'static str },

    /// 就绪轮询超时
    #[error("service not ready after {attempts} attempts ({waited_secs}s)")]
    Timeout { attempts: u32, waited_secs: u64 },

    /// 部署后校验失败
    #[error("verification failed: {0}")]
    Verification(String),

    /// 工作目录不是有效的部署根目录
    #[error("{0} is not a deployment directory (missing {1}); set REGISTRY_DIR to the deployment root")]
    NotDeploymentDir(String, &'static str),

    /// 配置缺失或无效
    #[error("configuration error: {0}")]
    Config(String),

    /// 外部命令执行失败
    #[error("command `{program}` failed: {message}")]
    Command { program: String, message: String },

    /// 备份/恢复文件问题
    #[error("backup error: {0}")]
    Backup(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OpsError {
    /// 创建命令失败错误
    pub fn command(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: message.into(),
        }
    }

    /// 创建校验失败错误
    pub fn verification(message: impl Into<String>) -> Self {
        Self::Verification(message.into())
    }

    /// 进程退出码
    pub fn exit_code(&self) -> u8 {
        match self {
            OpsError::Environment(_) => 10,
            OpsError::MissingDependency(_) => 11,
            OpsError::PortInUse { .. } => 12,
            OpsError::Timeout { .. } => 13,
            OpsError::Verification(_) => 14,
            OpsError::NotDeploymentDir(..) => 15,
            OpsError::Config(_) => 16,
            OpsError::Command { .. }
            | OpsError::Backup(_)
            | OpsError::Http(_)
            | OpsError::Io(_) => 1,
        }
    }
}

impl From<CommandError> for OpsError {
    fn from(e: CommandError) -> Self {
        match e {
            CommandError::SpawnFailed { program, source } => {
                OpsError::command(program, format!("failed to spawn: {}", source))
            }
            CommandError::Timeout { program } => OpsError::command(program, "timed out"),
            CommandError::Failed { program, code, stderr } => OpsError::command(
                program,
                format!(
                    "exited with {}: {}",
                    code.map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string()),
                    stderr.trim()
                ),
            ),
            CommandError::Io(e) => OpsError::Io(e),
        }
    }
}

/// 便捷类型别名
pub type OpsResult<T> = Result<T, OpsError>;
