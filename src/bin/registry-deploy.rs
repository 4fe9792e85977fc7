//! registry-deploy - 单次部署入口
//!
//! Usage:
//! - `registry-deploy --repo https://github.com/example/registry.git`
//! - `registry-deploy --dir /srv/registry --api-port 18080 --db-port 15432`

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use registry_ops::config::{constants, current_dir, OpsConfig};
use registry_ops::console;
use registry_ops::services::prompt::TerminalPrompter;
use registry_ops::services::Deployer;
use registry_ops::{block_on, exit_code_for, init_tracing};

#[derive(Parser)]
#[command(name = "registry-deploy", version)]
#[command(about = "Deploy the registry stack and verify it is healthy")]
struct Cli {
    /// Target directory (defaults to REGISTRY_DIR, then ./registry)
    #[arg(long)]
    dir: Option<PathBuf>,
    /// API port
    #[arg(long)]
    api_port: Option<u16>,
    /// Database port
    #[arg(long)]
    db_port: Option<u16>,
    /// Source repository to clone (defaults to REGISTRY_REPO_URL)
    #[arg(long)]
    repo: Option<String>,
    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = OpsConfig::from_env_with(
        current_dir().join(constants::DEFAULT_CHECKOUT_DIR),
        &[
            ("REGISTRY_DIR", cli.dir.map(|d| d.display().to_string())),
            ("API_PORT", cli.api_port.map(|p| p.to_string())),
            ("DB_PORT", cli.db_port.map(|p| p.to_string())),
            ("REGISTRY_REPO_URL", cli.repo),
        ],
    );

    // 流水线内的失败已经输出过
    let result = block_on(async move {
        let deployer = Deployer::local(config, Arc::new(TerminalPrompter)).map_err(|e| {
            console::fatal("setup", &e.to_string());
            e
        })?;
        deployer.run().await
    });
    exit_code_for(&result)
}
