//! Host preflight stages: platform, container runtime, compose, tools, ports

use tracing::{info, warn};

use crate::config::OpsConfig;
use crate::console;
use crate::domain::system::PlatformInfo;
use crate::error::{OpsError, OpsResult};
use crate::infra::{ComposeCommand, HostEnv};

/// Host must be Linux running Ubuntu or Debian
pub fn ensure_platform(host: &dyn HostEnv) -> OpsResult<PlatformInfo> {
    let platform = host.platform();
    platform.check().map_err(OpsError::Environment)?;
    console::success(&format!("Platform: {}", platform.describe()));
    Ok(platform)
}

/// Install the container runtime when absent
pub async fn ensure_docker(host: &dyn HostEnv) -> OpsResult<()> {
    if host.has_command("docker").await {
        console::success("Docker is installed");
        return Ok(());
    }

    console::info("Docker not found, installing...");
    info!("Installing docker");
    host.install_docker().await?;

    if !host.has_command("docker").await {
        return Err(OpsError::MissingDependency(
            "docker is still unavailable after installation".to_string(),
        ));
    }
    console::success("Docker installed");
    Ok(())
}

/// Resolve the compose command, installing the plugin when neither flavour exists
pub async fn ensure_compose(host: &dyn HostEnv) -> OpsResult<ComposeCommand> {
    if let Some(compose) = host.compose_command().await {
        console::success(&format!("Compose: {}", compose.display(&[])));
        return Ok(compose);
    }

    console::info("Docker Compose not found, installing plugin...");
    host.install_compose_plugin().await?;

    let compose = host.compose_command().await.ok_or_else(|| {
        OpsError::MissingDependency(
            "docker compose is still unavailable after installation".to_string(),
        )
    })?;
    console::success(&format!("Compose installed: {}", compose.display(&[])));
    Ok(compose)
}

/// Install every missing tool in one package-manager call
///
/// Returns the tools that were installed.
pub async fn ensure_tools(host: &dyn HostEnv, tools: &[&str]) -> OpsResult<Vec<String>> {
    let missing = missing_tools(host, tools).await;
    if missing.is_empty() {
        console::success(&format!("Tools present: {}", tools.join(", ")));
        return Ok(missing);
    }

    console::info(&format!("Installing {}...", missing.join(", ")));
    host.install_packages(&missing).await?;

    let still_missing = missing_tools(host, tools).await;
    if !still_missing.is_empty() {
        return Err(OpsError::MissingDependency(still_missing.join(", ")));
    }
    console::success(&format!("Installed {}", missing.join(", ")));
    Ok(missing)
}

async fn missing_tools(host: &dyn HostEnv, tools: &[&str]) -> Vec<String> {
    let mut missing = Vec::new();
    for tool in tools {
        if !host.has_command(tool).await {
            missing.push(tool.to_string());
        }
    }
    missing
}

/// Both ports must be free before anything is launched
pub async fn ensure_ports_free(host: &dyn HostEnv, config: &OpsConfig) -> OpsResult<()> {
    let ports: [(u16, &'static str); 2] = [(config.api_port, "API"), (config.db_port, "database")];
    for (port, purpose) in ports {
        if host.port_in_use(port).await {
            warn!(port, purpose, "Port already bound");
            console::check(&format!("{} port {}", purpose, port), false, "in use");
            return Err(OpsError::PortInUse { port, purpose });
        }
        console::check(&format!("{} port {}", purpose, port), true, "free");
    }
    Ok(())
}
