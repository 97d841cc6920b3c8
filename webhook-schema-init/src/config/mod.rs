//! Configuration and dependency initialization.

mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::{
    redact_url, InitConfig, RunMode, DEFAULT_MONGODB_TIMEOUT_SECS, DEFAULT_MONGODB_URL,
    DEFAULT_RUN_TIMEOUT_SECS,
};
