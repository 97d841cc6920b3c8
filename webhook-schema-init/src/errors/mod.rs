//! Error types for the schema init entrypoint.

use thiserror::Error;
use webhook_schema::{InitError, SchemaPlan};

/// Errors that can end a schema init run.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Schema initialization error.
    #[error(transparent)]
    Init(#[from] InitError),

    /// Check mode found changes that still need to be applied.
    #[error("Schema is out of date: collection missing: {collection_missing}, pending indexes: {pending:?}")]
    Drift {
        collection_missing: bool,
        pending: Vec<String>,
    },
}

impl BootstrapError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a drift error from a plan that is not up to date.
    pub fn drift(plan: &SchemaPlan) -> Self {
        Self::Drift {
            collection_missing: !plan.collection_exists,
            pending: plan.pending(),
        }
    }

    /// Process exit status for this error.
    ///
    /// Initialization errors keep their own codes (2 connection, 3 permission,
    /// 4 schema conflict), drift is 5, configuration is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigError(_) => 1,
            Self::Init(e) => e.exit_code(),
            Self::Drift { .. } => 5,
        }
    }
}
