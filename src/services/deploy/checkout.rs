//! Source checkout stage

use std::path::Path;
use tracing::info;

use crate::config::OpsConfig;
use crate::console;
use crate::error::{OpsError, OpsResult};
use crate::infra::SourceControl;
use crate::services::prompt::Prompter;
use crate::state::ensure_deployment_dir;

/// Clone the registry source, or reuse / replace an existing copy
pub async fn prepare_source(
    source: &dyn SourceControl,
    prompter: &dyn Prompter,
    config: &OpsConfig,
) -> OpsResult<()> {
    let dir = &config.work_dir;

    if has_existing_copy(dir) {
        let question = format!("{} already exists. Replace the existing copy?", dir.display());
        if prompter.confirm(&question) {
            console::info(&format!("Removing {}", dir.display()));
            info!(dir = %dir.display(), "Replacing existing checkout");
            tokio::fs::remove_dir_all(dir).await?;
            clone(source, config).await?;
        } else {
            console::info("Reusing the existing copy");
        }
    } else {
        clone(source, config).await?;
    }

    ensure_deployment_dir(config)?;
    console::success(&format!("Source ready in {}", dir.display()));
    Ok(())
}

/// A non-empty directory counts as an existing copy
fn has_existing_copy(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

async fn clone(source: &dyn SourceControl, config: &OpsConfig) -> OpsResult<()> {
    let url = config.repo_url.as_deref().ok_or_else(|| {
        OpsError::Config(
            "no source repository configured; set REGISTRY_REPO_URL or pass --repo".to_string(),
        )
    })?;
    if let Some(parent) = config.work_dir.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    console::info(&format!("Cloning {} into {}", url, config.work_dir.display()));
    source.clone_repo(url, &config.work_dir).await
}
