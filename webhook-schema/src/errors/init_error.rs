//! Schema initialization error types.
//!
//! This module defines the unified error type for all schema operations,
//! covering both backend failures (unreachable server, missing privileges)
//! and schema-level failures (conflicting index definitions, invalid specs).

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server error code: the caller is not authorized for the command.
pub const CODE_UNAUTHORIZED: i32 = 13;
/// MongoDB server error code: authentication failed.
pub const CODE_AUTHENTICATION_FAILED: i32 = 18;
/// MongoDB server error code: the namespace does not exist.
pub const CODE_NAMESPACE_NOT_FOUND: i32 = 26;
/// MongoDB server error code: the namespace already exists.
pub const CODE_NAMESPACE_EXISTS: i32 = 48;
/// MongoDB server error code: an index with the same keys has different options.
pub const CODE_INDEX_OPTIONS_CONFLICT: i32 = 85;
/// MongoDB server error code: an index with the same name has different keys.
pub const CODE_INDEX_KEY_SPECS_CONFLICT: i32 = 86;

/// Unified errors from schema initialization.
///
/// Used by the `SchemaCatalog` trait and `SchemaInitializer`. All variants abort
/// the run; none is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// The database server cannot be reached (refused, timed out, no suitable server).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The caller lacks the rights to create collections or indexes.
    #[error("Permission error: {0}")]
    PermissionError(String),

    /// An existing index definition conflicts with the desired one.
    #[error("Schema conflict on index '{index}': {reason}")]
    SchemaConflictError { index: String, reason: String },

    /// A desired index specification is malformed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unknown error.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl InitError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a permission error.
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionError(msg.into())
    }

    /// Create a schema conflict error for the named index.
    pub fn schema_conflict(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaConflictError {
            index: index.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create an unknown error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Classify a MongoDB command failure by its server error code.
    ///
    /// `index` names the index the command was about, if any; it is used to
    /// label conflicts.
    pub fn from_command_code(code: i32, message: &str, index: Option<&str>) -> Self {
        match code {
            CODE_UNAUTHORIZED | CODE_AUTHENTICATION_FAILED => Self::permission(message),
            CODE_INDEX_OPTIONS_CONFLICT | CODE_INDEX_KEY_SPECS_CONFLICT => {
                Self::schema_conflict(index.unwrap_or("<unknown>"), message)
            }
            _ => Self::unknown(format!("command failed with code {}: {}", code, message)),
        }
    }

    /// Whether this error means the server could not be reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }

    /// Process exit status for this error.
    ///
    /// 2 connection, 3 permission, 4 schema conflict, 1 anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ConnectionError(_) => 2,
            Self::PermissionError(_) => 3,
            Self::SchemaConflictError { .. } => 4,
            Self::ValidationError(_) | Self::Unknown(_) => 1,
        }
    }
}

/// Returns the server error code carried by a MongoDB error, if any.
pub(crate) fn command_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteConcernError(concern)) => Some(concern.code),
        _ => None,
    }
}

impl From<mongodb::error::Error> for InitError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { message, .. } => Self::connection(message.clone()),
            ErrorKind::Io(io) => Self::connection(io.to_string()),
            ErrorKind::ConnectionPoolCleared { message, .. } => Self::connection(message.clone()),
            ErrorKind::DnsResolve { message, .. } => Self::connection(message.clone()),
            ErrorKind::Authentication { message, .. } => Self::permission(message.clone()),
            ErrorKind::InvalidArgument { message, .. } => Self::validation(message.clone()),
            ErrorKind::Command(command) => {
                Self::from_command_code(command.code, &command.message, None)
            }
            _ => match command_code(&err) {
                Some(code) => Self::from_command_code(code, &err.to_string(), None),
                None => Self::unknown(err.to_string()),
            },
        }
    }
}
