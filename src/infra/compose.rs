//! Docker Compose stack
//!
//! Wraps the compose CLI for the deployment directory: lifecycle commands,
//! container listing, logs and exec sessions.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpsConfig;
use crate::domain::container::{parse_ps_output, ContainerInfo, PS_FORMAT};
use crate::error::{OpsError, OpsResult};
use crate::infra::command::CommandRunner;

/// Timeout for `up --build`, which may build images from scratch
const UP_TIMEOUT: Duration = Duration::from_secs(1800);
const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(300);
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Which compose binary to call and with which leading args
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeCommand {
    pub program: &'static str,
    pub base_args: Vec<&'static str>,
}

impl ComposeCommand {
    pub fn plugin() -> Self {
        Self {
            program: "docker",
            base_args: vec!["compose"],
        }
    }

    pub fn standalone() -> Self {
        Self {
            program: "docker-compose",
            base_args: vec![],
        }
    }

    /// Detect the compose command (prefer the `docker compose` plugin, fall back to `docker-compose`)
    pub async fn detect() -> Option<Self> {
        let work_dir = std::env::temp_dir();
        let plugin = CommandRunner::run_simple(
            "docker",
            &["compose", "version"],
            &work_dir,
            &[],
            QUERY_TIMEOUT,
        )
        .await;
        if plugin.map(|o| o.status.success()).unwrap_or(false) {
            return Some(Self::plugin());
        }

        if CommandRunner::exists("docker-compose").await {
            return Some(Self::standalone());
        }

        None
    }

    /// Full argument list: base args followed by `args`
    pub fn args<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        self.base_args
            .iter()
            .map(|s| s.to_string())
            .chain(args.iter().map(|s| s.as_ref().to_string()))
            .collect()
    }

    pub fn display(&self, args: &[&str]) -> String {
        self.args(args).iter().fold(self.program.to_string(), |mut acc, a| {
            acc.push(' ');
            acc.push_str(a);
            acc
        })
    }
}

/// Operations on the compose stack of the deployment directory
#[async_trait]
pub trait Stack: Send + Sync {
    /// `up -d`, optionally rebuilding images
    async fn up(&self, build: bool) -> OpsResult<()>;
    /// `down`, optionally removing volumes
    async fn down(&self, remove_volumes: bool) -> OpsResult<()>;
    async fn restart(&self) -> OpsResult<()>;
    async fn ps(&self) -> OpsResult<Vec<ContainerInfo>>;
    /// Last `lines` log lines of all services, captured
    async fn logs_tail(&self, lines: usize) -> OpsResult<String>;
    /// Print logs to the terminal, following when `follow` is set
    async fn show_logs(&self, service: Option<&str>, tail: usize, follow: bool) -> OpsResult<()>;
    /// Interactive command inside a service container
    async fn exec_interactive(&self, service: &str, command: &[String]) -> OpsResult<()>;
    /// One-shot resource usage table
    async fn resource_usage(&self) -> OpsResult<String>;
}

/// Compose CLI implementation
pub struct ComposeStack {
    config: Arc<OpsConfig>,
    compose: ComposeCommand,
}

impl ComposeStack {
    pub fn new(config: Arc<OpsConfig>, compose: ComposeCommand) -> Self {
        Self { config, compose }
    }

    async fn run_streaming(&self, args: &[&str], timeout: Duration) -> OpsResult<()> {
        tracing::info!(command = %self.compose.display(args), "Running compose");
        CommandRunner::run_streaming(
            self.compose.program,
            &self.compose.args(args),
            &self.config.work_dir,
            &self.config.compose_env(),
            timeout,
        )
        .await
        .map_err(OpsError::from)
    }

    async fn run_captured(&self, args: &[&str]) -> OpsResult<String> {
        CommandRunner::run_checked(
            self.compose.program,
            &self.compose.args(args),
            &self.config.work_dir,
            &self.config.compose_env(),
            QUERY_TIMEOUT,
        )
        .await
        .map_err(OpsError::from)
    }

    async fn run_interactive(&self, args: &[String]) -> OpsResult<()> {
        let status = CommandRunner::run_interactive(
            self.compose.program,
            &self.compose.args(args),
            &self.config.work_dir,
            &self.config.compose_env(),
        )
        .await?;
        // 130 = interrupted with Ctrl-C, the normal way to leave `logs -f`
        match status.code() {
            Some(0) | Some(130) | None => Ok(()),
            Some(code) => Err(OpsError::command(
                self.compose.program,
                format!("exited with {}", code),
            )),
        }
    }
}

#[async_trait]
impl Stack for ComposeStack {
    async fn up(&self, build: bool) -> OpsResult<()> {
        if build {
            self.run_streaming(&["up", "-d", "--build"], UP_TIMEOUT).await
        } else {
            self.run_streaming(&["up", "-d"], UP_TIMEOUT).await
        }
    }

    async fn down(&self, remove_volumes: bool) -> OpsResult<()> {
        if remove_volumes {
            self.run_streaming(&["down", "-v"], LIFECYCLE_TIMEOUT).await
        } else {
            self.run_streaming(&["down"], LIFECYCLE_TIMEOUT).await
        }
    }

    async fn restart(&self) -> OpsResult<()> {
        self.run_streaming(&["restart"], LIFECYCLE_TIMEOUT).await
    }

    async fn ps(&self) -> OpsResult<Vec<ContainerInfo>> {
        let output = self.run_captured(&["ps", "-a", "--format", PS_FORMAT]).await?;
        Ok(parse_ps_output(&output))
    }

    async fn logs_tail(&self, lines: usize) -> OpsResult<String> {
        let tail = format!("--tail={}", lines);
        self.run_captured(&["logs", "--no-color", &tail]).await
    }

    async fn show_logs(&self, service: Option<&str>, tail: usize, follow: bool) -> OpsResult<()> {
        let mut args = vec!["logs".to_string(), format!("--tail={}", tail)];
        if follow {
            args.push("-f".to_string());
        }
        if let Some(service) = service {
            args.push(service.to_string());
        }
        self.run_interactive(&args).await
    }

    async fn exec_interactive(&self, service: &str, command: &[String]) -> OpsResult<()> {
        let mut args = vec!["exec".to_string(), service.to_string()];
        args.extend(command.iter().cloned());
        self.run_interactive(&args).await
    }

    async fn resource_usage(&self) -> OpsResult<String> {
        let names: Vec<String> = self
            .ps()
            .await?
            .into_iter()
            .filter(|c| c.is_running())
            .map(|c| c.name)
            .collect();
        if names.is_empty() {
            return Ok(String::new());
        }

        let mut args = vec![
            "stats".to_string(),
            "--no-stream".to_string(),
            "--format".to_string(),
            "table {{.Name}}\t{{.CPUPerc}}\t{{.MemUsage}}\t{{.NetIO}}\t{{.BlockIO}}".to_string(),
        ];
        args.extend(names);

        CommandRunner::run_checked("docker", &args, &self.config.work_dir, &[], QUERY_TIMEOUT)
            .await
            .map_err(OpsError::from)
    }
}
