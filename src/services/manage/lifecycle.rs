//! start / stop / restart / update

use tracing::info;

use crate::console;
use crate::error::OpsResult;
use crate::services::deploy::readiness::settle_and_probe;
use crate::state::OpsContext;

pub async fn start(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Starting services");
    ctx.stack.up(false).await?;
    console::success("Services started");
    settle_and_probe(&ctx.api, ctx.settle_delay).await;
    Ok(())
}

pub async fn stop(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Stopping services");
    ctx.stack.down(false).await?;
    console::success("Services stopped");
    Ok(())
}

pub async fn restart(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Restarting services");
    ctx.stack.restart().await?;
    console::success("Services restarted");
    settle_and_probe(&ctx.api, ctx.settle_delay).await;
    Ok(())
}

/// git pull, rebuild, relaunch
pub async fn update(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Updating registry");

    console::info("Pulling latest source...");
    let output = ctx.source.pull(&ctx.config.work_dir).await?;
    console::block(&output);
    info!(dir = %ctx.config.work_dir.display(), "Source updated");

    console::info("Rebuilding and restarting...");
    ctx.stack.up(true).await?;
    console::success("Update applied");

    settle_and_probe(&ctx.api, ctx.settle_delay).await;
    Ok(())
}
