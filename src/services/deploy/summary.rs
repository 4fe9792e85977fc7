//! End-of-run output

use crate::config::constants::{HEALTH_PATH, LIST_PATH, PING_PATH};
use crate::config::OpsConfig;
use crate::console;
use crate::domain::deploy::{DeployStage, StageStatus};

/// One line per stage, printed after every run
pub fn print_stage_summary(stages: &[DeployStage]) {
    console::header("Stage summary");
    let lines: Vec<String> = stages.iter().map(DeployStage::summary_line).collect();
    console::block(&lines.join("\n"));

    let succeeded = stages
        .iter()
        .filter(|s| s.status == StageStatus::Success)
        .count();
    console::kv("Completed", &format!("{}/{}", succeeded, stages.len()));
}

/// Access URLs, credentials and follow-up commands
pub fn print_access_info(config: &OpsConfig) {
    let base = config.api_base_url();

    console::header("Registry is up");
    console::kv("API", &base);
    console::kv("Liveness", &format!("{}{}", base, PING_PATH));
    console::kv("Health", &format!("{}{}", base, HEALTH_PATH));
    console::kv("Servers", &format!("{}{}", base, LIST_PATH));
    console::kv("Database", &config.database_url());

    console::header("Next steps");
    console::kv("Directory", &format!("cd {}", config.work_dir.display()));
    for (label, command) in next_steps() {
        console::kv(label, command);
    }
}

fn next_steps() -> [(&'static str, &'static str); 5] {
    [
        ("Status", "registry-ops status"),
        ("Logs", "registry-ops logs -f"),
        ("Health", "registry-ops health"),
        ("Backup", "registry-ops backup"),
        ("Stop", "registry-ops stop"),
    ]
}
