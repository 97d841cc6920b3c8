//! Webhook Schema Init Main Entry Point
//!
//! Prepares the MongoDB collection and indexes used to store captured webhook
//! requests. Intended to run once per deployment, e.g. as a container
//! entrypoint; the exit status tells the deployment whether it worked.

use std::env;
use std::process::ExitCode;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use webhook_schema_init::{connect_and_run, BootstrapError, Dependencies, InitConfig, Outcome};

/// Initialize tracing/logging.
///
/// `LOG_FORMAT=json` switches to structured JSON lines; anything else gives
/// console output. Events go to stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("webhook_schema=info,webhook_schema_init=info"));

    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }

    info!(
        service_name = "webhook-schema-init",
        service_version = env!("CARGO_PKG_VERSION"),
        "Tracing initialized"
    );
}

async fn start() -> Result<Outcome, BootstrapError> {
    let config = InitConfig::from_env()?;
    connect_and_run(Dependencies::new(&config), config.mode, config.run_timeout).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing();

    match start().await {
        Ok(Outcome::Initialized(report)) => {
            info!(
                database = %report.database,
                collection = %report.collection,
                created = ?report.created,
                "Schema initialization finished"
            );
            ExitCode::SUCCESS
        }
        Ok(Outcome::Checked(plan)) => {
            info!(indexes = plan.indexes.len(), "Schema check finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, exit_code = e.exit_code(), "Schema initialization failed");
            ExitCode::from(e.exit_code())
        }
    }
}
