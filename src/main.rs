//! registry-ops - 管理命令入口
//!
//! Usage:
//! - `registry-ops status`
//! - `registry-ops logs registry -f`
//! - `registry-ops --dir /srv/registry backup`
//! - `registry-ops restore backup_20260118_093012.sql`

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use registry_ops::config::{current_dir, OpsConfig};
use registry_ops::console;
use registry_ops::services::prompt::TerminalPrompter;
use registry_ops::services::{dispatch, Verb};
use registry_ops::state::OpsContext;
use registry_ops::{block_on, exit_code_for, init_tracing};

#[derive(Parser)]
#[command(name = "registry-ops", version)]
#[command(about = "Manage a deployed registry stack")]
struct Cli {
    /// Deployment root (defaults to REGISTRY_DIR, then the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,
    /// API port
    #[arg(long, global = true)]
    api_port: Option<u16>,
    /// Database port
    #[arg(long, global = true)]
    db_port: Option<u16>,
    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    verb: Verb,
}

impl Cli {
    fn config(&self) -> OpsConfig {
        OpsConfig::from_env_with(
            current_dir(),
            &[
                ("REGISTRY_DIR", self.dir.as_ref().map(|d| d.display().to_string())),
                ("API_PORT", self.api_port.map(|p| p.to_string())),
                ("DB_PORT", self.db_port.map(|p| p.to_string())),
            ],
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config();
    let verb = cli.verb;
    let label = verb.name();
    let result = block_on(async move {
        let ctx = OpsContext::connect(config, Arc::new(TerminalPrompter)).await?;
        dispatch(&ctx, verb).await
    });

    if let Err(e) = &result {
        console::fatal(label, &e.to_string());
    }
    exit_code_for(&result)
}
