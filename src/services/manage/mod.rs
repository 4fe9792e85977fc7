//! 管理命令模块
//!
//! 每个动词对应一个 handler；除 help（由 clap 处理）外，都先校验部署目录

pub mod data;
pub mod inspect;
pub mod lifecycle;
pub mod session;

use clap::Subcommand;
use tracing::info;

use crate::error::OpsResult;
use crate::state::OpsContext;

/// 默认日志行数
const DEFAULT_LOG_TAIL: usize = 100;

/// 管理动词
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Verb {
    /// Show container states and probe the API once
    Status,
    /// Start the stack and probe the API after a short delay
    Start,
    /// Stop the stack
    Stop,
    /// Restart the stack and probe the API after a short delay
    Restart,
    /// Show recent logs, optionally following them
    Logs {
        /// Only show logs of this compose service
        service: Option<String>,
        /// Follow the log output
        #[arg(short, long)]
        follow: bool,
        /// Number of lines to show from the end of the logs
        #[arg(long, default_value_t = DEFAULT_LOG_TAIL)]
        tail: usize,
    },
    /// Check liveness, health and database readiness
    Health,
    /// Show record counts and container resource usage
    Stats,
    /// Remove containers, volumes and local data (asks for confirmation)
    Clean,
    /// Dump the database into the backup directory
    Backup,
    /// Restore the database from a backup file (asks for confirmation)
    Restore {
        /// Backup file name or path; prompted for when omitted
        file: Option<String>,
    },
    /// Run the endpoint test script, or the built-in probes
    Test,
    /// Pull the latest source, rebuild and restart
    Update,
    /// Open a shell in a service container
    Shell {
        /// Compose service (defaults to the API service)
        service: Option<String>,
    },
    /// Open psql in the database container
    Psql,
}

impl Verb {
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Status => "status",
            Verb::Start => "start",
            Verb::Stop => "stop",
            Verb::Restart => "restart",
            Verb::Logs { .. } => "logs",
            Verb::Health => "health",
            Verb::Stats => "stats",
            Verb::Clean => "clean",
            Verb::Backup => "backup",
            Verb::Restore { .. } => "restore",
            Verb::Test => "test",
            Verb::Update => "update",
            Verb::Shell { .. } => "shell",
            Verb::Psql => "psql",
        }
    }
}

/// 分发动词到对应 handler
pub async fn dispatch(ctx: &OpsContext, verb: Verb) -> OpsResult<()> {
    ctx.ensure_deployment_dir()?;
    info!(verb = verb.name(), dir = %ctx.config.work_dir.display(), "Running command");

    match verb {
        Verb::Status => inspect::status(ctx).await,
        Verb::Start => lifecycle::start(ctx).await,
        Verb::Stop => lifecycle::stop(ctx).await,
        Verb::Restart => lifecycle::restart(ctx).await,
        Verb::Logs {
            service,
            follow,
            tail,
        } => inspect::logs(ctx, service.as_deref(), tail, follow).await,
        Verb::Health => inspect::health(ctx).await,
        Verb::Stats => inspect::stats(ctx).await,
        Verb::Clean => data::clean(ctx).await.map(|_| ()),
        Verb::Backup => data::backup(ctx).await.map(|_| ()),
        Verb::Restore { file } => data::restore(ctx, file.as_deref()).await.map(|_| ()),
        Verb::Test => inspect::test(ctx).await,
        Verb::Update => lifecycle::update(ctx).await,
        Verb::Shell { service } => session::shell(ctx, service.as_deref()).await,
        Verb::Psql => session::psql(ctx).await,
    }
}
