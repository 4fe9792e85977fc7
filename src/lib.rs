//! Registry Ops - 容器化 registry 服务的部署与运维工具
//!
//! 两个入口共用本库：
//! - `registry-deploy`：单次部署流水线
//! - `registry-ops`：管理命令分发

pub mod config;
pub mod console;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod state;

pub use config::OpsConfig;
pub use error::{OpsError, OpsResult};

use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// 初始化日志：`RUST_LOG` 优先，否则默认 warn（`--verbose` 时 debug），输出到 stderr
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// 把命令结果映射为进程退出码
pub fn exit_code_for(result: &OpsResult<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(e.exit_code()),
    }
}

/// 构造单线程 tokio runtime 并执行
pub fn block_on<F>(future: F) -> OpsResult<()>
where
    F: std::future::Future<Output = OpsResult<()>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
