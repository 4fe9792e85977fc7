//! 宿主机操作
//!
//! 平台探测、工具检测与安装、端口占用检查

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use sysinfo::System;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::domain::system::PlatformInfo;
use crate::error::{OpsError, OpsResult};
use crate::infra::command::CommandRunner;
use crate::infra::compose::ComposeCommand;

const INSTALL_TIMEOUT: Duration = Duration::from_secs(900);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Docker 官方安装脚本
const DOCKER_INSTALL_SCRIPT: &str = "https://get.docker.com";

/// 宿主机能力
#[async_trait]
pub trait HostEnv: Send + Sync {
    fn platform(&self) -> PlatformInfo;
    async fn has_command(&self, program: &str) -> bool;
    async fn compose_command(&self) -> Option<ComposeCommand>;
    async fn install_docker(&self) -> OpsResult<()>;
    async fn install_compose_plugin(&self) -> OpsResult<()>;
    /// 一次包管理器调用安装全部包
    async fn install_packages(&self, packages: &[String]) -> OpsResult<()>;
    async fn port_in_use(&self, port: u16) -> bool;
}

/// 本机实现
pub struct LocalHost;

impl LocalHost {
    fn work_dir() -> PathBuf {
        std::env::temp_dir()
    }

    async fn is_root() -> bool {
        CommandRunner::run_checked("id", &["-u"], &Self::work_dir(), &[], CONNECT_TIMEOUT * 5)
            .await
            .map(|out| out.trim() == "0")
            .unwrap_or(false)
    }

    /// 以 root 身份执行 shell 脚本（非 root 时经 sudo）
    async fn run_privileged(script: &str) -> OpsResult<()> {
        let (program, args): (&str, Vec<&str>) = if Self::is_root().await {
            ("sh", vec!["-c", script])
        } else {
            ("sudo", vec!["sh", "-c", script])
        };
        info!(script, "Running privileged command");
        CommandRunner::run_streaming(program, &args, &Self::work_dir(), &[], INSTALL_TIMEOUT)
            .await
            .map_err(OpsError::from)
    }
}

#[async_trait]
impl HostEnv for LocalHost {
    fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            os_family: std::env::consts::OS.to_string(),
            distro: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            hostname: System::host_name(),
        }
    }

    async fn has_command(&self, program: &str) -> bool {
        CommandRunner::exists(program).await
    }

    async fn compose_command(&self) -> Option<ComposeCommand> {
        ComposeCommand::detect().await
    }

    async fn install_docker(&self) -> OpsResult<()> {
        let script = format!(
            "apt-get update -qq && apt-get install -y -qq curl ca-certificates && curl -fsSL {} | sh",
            DOCKER_INSTALL_SCRIPT
        );
        Self::run_privileged(&script).await?;

        // 非 root 用户加入 docker 组，下次登录后无需 sudo
        if !Self::is_root().await {
            if let Ok(user) = std::env::var("USER") {
                if let Err(e) = Self::run_privileged(&format!("usermod -aG docker {}", user)).await {
                    warn!(error = %e, user = %user, "Failed to add user to docker group");
                }
            }
        }
        Ok(())
    }

    async fn install_compose_plugin(&self) -> OpsResult<()> {
        Self::run_privileged("apt-get update -qq && apt-get install -y -qq docker-compose-plugin")
            .await
    }

    async fn install_packages(&self, packages: &[String]) -> OpsResult<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let script = format!(
            "apt-get update -qq && apt-get install -y -qq {}",
            packages.join(" ")
        );
        Self::run_privileged(&script).await
    }

    async fn port_in_use(&self, port: u16) -> bool {
        match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(_) => false,
            Err(e) if e.kind() == ErrorKind::AddrInUse => true,
            Err(e) => {
                // 无权限绑定（如非 root 的低端口）时改用连接探测
                warn!(port, error = %e, "Bind probe inconclusive, trying connect");
                matches!(
                    tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(("127.0.0.1", port))).await,
                    Ok(Ok(_))
                )
            }
        }
    }
}
