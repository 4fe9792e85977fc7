//! Readiness polling and post-launch verification

use std::time::Duration;
use tracing::{debug, warn};

use crate::config::constants::PING_PATH;
use crate::config::{OpsConfig, PollConfig};
use crate::console;
use crate::domain::container::service_running;
use crate::domain::health::ProbeOutcome;
use crate::error::{OpsError, OpsResult};
use crate::infra::{RegistryApi, Stack};
use crate::services::retry::{poll_until, PollResult};

/// Poll the liveness endpoint until a request completes
///
/// Any HTTP response counts; the body is checked later by `verify`.
/// Returns the attempt that succeeded.
pub async fn wait_until_ready(api: &RegistryApi, poll: PollConfig) -> OpsResult<u32> {
    console::info(&format!(
        "Waiting for {} (up to {} attempts, {:?} apart, {:?} total)",
        api.url(PING_PATH),
        poll.max_attempts,
        poll.interval,
        poll.budget()
    ));

    let result = poll_until(
        poll,
        || api.ping(),
        |response| response.is_ok(),
        |attempt, response| {
            if let Err(e) = response {
                debug!(attempt, error = %e, "Liveness probe failed");
            }
            console::stream_line(&format!(
                "attempt {}/{}: not responding yet",
                attempt, poll.max_attempts
            ));
        },
    )
    .await;

    match result {
        PollResult::Ready { attempt, .. } => {
            console::success(&format!("API responded after {} attempt(s)", attempt));
            Ok(attempt)
        }
        PollResult::Exhausted {
            attempts, elapsed, ..
        } => Err(OpsError::Timeout {
            attempts,
            waited_secs: elapsed.as_secs(),
        }),
    }
}

/// Fixed post-launch checks; the first failure aborts
pub async fn verify(api: &RegistryApi, stack: &dyn Stack, config: &OpsConfig) -> OpsResult<()> {
    expect_pass("Liveness endpoint", api.check_ping().await)?;
    expect_pass("Health endpoint", api.check_health().await)?;
    expect_pass("Listing endpoint", api.check_list().await)?;

    let containers = stack.ps().await?;
    for service in [&config.api_service, &config.db_service] {
        let running = service_running(&containers, service);
        let label = format!("Service {}", service);
        console::check(&label, running, if running { "running" } else { "not running" });
        if !running {
            return Err(OpsError::verification(format!(
                "service {} is not running",
                service
            )));
        }
    }
    Ok(())
}

fn expect_pass(label: &str, outcome: ProbeOutcome) -> OpsResult<()> {
    console::check(label, outcome.is_pass(), outcome.detail());
    match outcome {
        ProbeOutcome::Pass(_) => Ok(()),
        ProbeOutcome::Fail(reason) => Err(OpsError::verification(format!("{}: {}", label, reason))),
    }
}

/// Print the tail of the stack logs for diagnosis
pub async fn dump_recent_logs(stack: &dyn Stack, lines: usize) {
    console::header(&format!("Last {} log lines", lines));
    match stack.logs_tail(lines).await {
        Ok(text) => console::block(&text),
        Err(e) => {
            warn!(error = %e, "Failed to collect logs");
            console::error(&format!("could not collect logs: {}", e));
        }
    }
}

/// Wait for the stack to settle, then probe liveness once
///
/// Not responding yet is a warning, not an error.
pub async fn settle_and_probe(api: &RegistryApi, delay: Duration) -> bool {
    console::info(&format!("Waiting {:?} for the service to settle...", delay));
    tokio::time::sleep(delay).await;

    match api.check_ping().await {
        ProbeOutcome::Pass(_) => {
            console::success(&format!("API is responding at {}", api.base_url()));
            true
        }
        ProbeOutcome::Fail(reason) => {
            console::warn(&format!(
                "API is not responding yet ({}); check `registry-ops logs`",
                reason
            ));
            false
        }
    }
}
