//! Interface definitions for the schema catalog.
//!
//! This module defines the abstract `SchemaCatalog` trait that allows
//! for dependency injection and swappable database backends.

mod schema_catalog;

pub use schema_catalog::SchemaCatalog;
