//! # Webhook Schema Init
//!
//! Zero-argument deployment entrypoint that prepares the webhook request
//! store: it reads its settings from the environment, connects to MongoDB,
//! runs the schema initializer once and exits.
//!
//! ## Modules
//!
//! - [`config`]: Environment configuration and dependency wiring
//! - [`runner`]: One bounded run with guaranteed connection release
//! - [`errors`]: Error types and exit codes

pub mod config;
pub mod errors;
pub mod runner;

pub use config::{Dependencies, InitConfig, RunMode};
pub use errors::BootstrapError;
pub use runner::{connect_and_run, run, Outcome};
