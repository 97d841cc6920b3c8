//! Error types for the webhook schema initializer.
//!
//! This module provides a unified error type for all schema operations.

mod init_error;

pub(crate) use init_error::command_code;
pub use init_error::{
    InitError, CODE_AUTHENTICATION_FAILED, CODE_INDEX_KEY_SPECS_CONFLICT,
    CODE_INDEX_OPTIONS_CONFLICT, CODE_NAMESPACE_EXISTS, CODE_NAMESPACE_NOT_FOUND,
    CODE_UNAUTHORIZED,
};
