//! status / logs / health / stats / test

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::config::constants;
use crate::console;
use crate::domain::database::{parse_status_counts, status_count_sql};
use crate::domain::health::ProbeOutcome;
use crate::error::{OpsError, OpsResult};
use crate::infra::CommandRunner;
use crate::state::OpsContext;

/// Container states plus one liveness probe; never fatal
pub async fn status(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Containers");
    match ctx.stack.ps().await {
        Ok(containers) if containers.is_empty() => console::warn("No containers found"),
        Ok(containers) => {
            for c in &containers {
                let detail = if c.ports.is_empty() {
                    c.status.clone()
                } else {
                    format!("{} [{}]", c.status, c.ports.join(", "))
                };
                console::check(&c.service, c.is_running(), &detail);
            }
        }
        Err(e) => console::error(&format!("could not list containers: {}", e)),
    }

    console::header("API");
    report("Liveness", ctx.api.check_ping().await);
    Ok(())
}

pub async fn logs(
    ctx: &OpsContext,
    service: Option<&str>,
    tail: usize,
    follow: bool,
) -> OpsResult<()> {
    ctx.stack.show_logs(service, tail, follow).await
}

/// Each check is reported on its own; failures do not stop the others
pub async fn health(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Health");
    report("Liveness", ctx.api.check_ping().await);
    report("Health endpoint", ctx.api.check_health().await);

    match ctx.db.is_ready().await {
        Ok(ready) => console::check(
            "Database",
            ready,
            if ready { "accepting connections" } else { "not ready" },
        ),
        Err(e) => console::check("Database", false, &e.to_string()),
    }
    Ok(())
}

/// Record counts and resource usage; each source degrades to a warning
pub async fn stats(ctx: &OpsContext) -> OpsResult<()> {
    console::header("Records");
    match ctx.api.record_count().await {
        Ok(count) => console::kv("Servers (API)", &count.to_string()),
        Err(e) => {
            warn!(error = %e, "Record count unavailable");
            console::warn(&format!("record count unavailable: {}", e));
        }
    }

    let sql = status_count_sql(constants::RECORDS_TABLE, constants::STATUS_COLUMN);
    match ctx.db.query(&sql).await {
        Ok(output) => {
            let counts = parse_status_counts(&output);
            if counts.is_empty() {
                console::info("No records in the database");
            }
            for row in counts {
                console::kv(&row.status, &row.count.to_string());
            }
        }
        Err(e) => {
            warn!(error = %e, "Status query failed");
            console::warn(&format!("database statistics unavailable: {}", e));
        }
    }

    console::header("Resources");
    match ctx.stack.resource_usage().await {
        Ok(table) if table.trim().is_empty() => console::info("No running containers"),
        Ok(table) => console::block(&table),
        Err(e) => console::warn(&format!("resource usage unavailable: {}", e)),
    }
    Ok(())
}

/// Delegate to the endpoint test script when one exists, else probe inline
pub async fn test(ctx: &OpsContext) -> OpsResult<()> {
    if let Some(script) = find_endpoint_test_script(&ctx.config.work_dir) {
        console::header(&format!("Running {}", script.display()));
        let envs = vec![("API_URL".to_string(), ctx.api.base_url().to_string())];
        let status =
            CommandRunner::run_interactive("bash", &[&script], &ctx.config.work_dir, &envs).await?;
        if !status.success() {
            return Err(OpsError::verification(format!(
                "{} exited with {}",
                script.display(),
                status.code().unwrap_or(-1)
            )));
        }
        return Ok(());
    }

    console::header("Endpoint tests");
    let results = [
        ("Liveness", ctx.api.check_ping().await),
        ("Health", ctx.api.check_health().await),
        ("Listing", ctx.api.check_list().await),
    ];
    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, outcome)| !outcome.is_pass())
        .map(|(label, _)| *label)
        .collect();
    for (label, outcome) in results {
        report(label, outcome);
    }

    if failed.is_empty() {
        console::success("All endpoint tests passed");
        Ok(())
    } else {
        Err(OpsError::verification(format!("failed: {}", failed.join(", "))))
    }
}

/// First existing endpoint test script under `dir`
pub fn find_endpoint_test_script(dir: &Path) -> Option<PathBuf> {
    constants::ENDPOINT_TEST_SCRIPTS
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.is_file())
}

fn report(label: &str, outcome: ProbeOutcome) {
    console::check(label, outcome.is_pass(), outcome.detail());
}
