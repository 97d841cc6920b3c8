//! Runs one schema initialization from start to finish.
//!
//! The time limit covers connecting as well as the run itself. The catalog
//! connection is owned by the run and closed on every exit path, including
//! timeouts.

use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};
use webhook_schema::{InitError, InitReport, SchemaInitializer, SchemaPlan};

use crate::config::{Dependencies, RunMode};
use crate::errors::BootstrapError;

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Apply mode: the schema is now in place.
    Initialized(InitReport),
    /// Check mode: the schema was already up to date.
    Checked(SchemaPlan),
}

/// Connect with `connect`, then execute the run in `mode`.
///
/// `limit` bounds both steps together, so a slow DNS lookup or server
/// selection counts against the same budget as the schema work.
///
/// # Returns
///
/// * `Ok(Outcome)` - The schema is in place (or, in check mode, already was)
/// * `Err(BootstrapError::Init(InitError::ConnectionError))` - If `limit` elapsed
/// * `Err(BootstrapError)` - Any other failure
pub async fn connect_and_run<F>(
    connect: F,
    mode: RunMode,
    limit: Duration,
) -> Result<Outcome, BootstrapError>
where
    F: Future<Output = Result<Dependencies, BootstrapError>>,
{
    let deadline = Instant::now() + limit;
    let deps = match timeout_at(deadline, connect).await {
        Ok(deps) => deps?,
        Err(_) => return Err(timed_out(limit)),
    };
    run_until(deps, mode, deadline, limit).await
}

/// Execute the run in `mode` on already connected dependencies, bounded by
/// `limit`, then release the catalog.
pub async fn run(
    deps: Dependencies,
    mode: RunMode,
    limit: Duration,
) -> Result<Outcome, BootstrapError> {
    run_until(deps, mode, Instant::now() + limit, limit).await
}

async fn run_until(
    deps: Dependencies,
    mode: RunMode,
    deadline: Instant,
    limit: Duration,
) -> Result<Outcome, BootstrapError> {
    let Dependencies {
        catalog,
        initializer,
    } = deps;

    let result = match timeout_at(deadline, execute(&initializer, mode)).await {
        Ok(result) => result,
        Err(_) => Err(timed_out(limit)),
    };

    catalog.close().await;
    result
}

fn timed_out(limit: Duration) -> BootstrapError {
    warn!(limit_secs = limit.as_secs(), "Schema initialization timed out");
    InitError::connection(format!(
        "schema initialization did not finish within {}s",
        limit.as_secs()
    ))
    .into()
}

async fn execute(
    initializer: &SchemaInitializer,
    mode: RunMode,
) -> Result<Outcome, BootstrapError> {
    match mode {
        RunMode::Apply => Ok(Outcome::Initialized(initializer.initialize().await?)),
        RunMode::Check => {
            let plan = initializer.plan().await?;
            if !plan.is_up_to_date() {
                return Err(BootstrapError::drift(&plan));
            }
            info!(
                database = %plan.database,
                collection = %plan.collection,
                "Schema is up to date"
            );
            Ok(Outcome::Checked(plan))
        }
    }
}
