//! # Webhook Schema
//!
//! This crate prepares the database that stores captured webhook requests.
//! It ensures the request collection exists and that the secondary indexes
//! the capture service queries by are in place. Every step is idempotent, so
//! the initializer can run on each deployment.
//!
//! The desired indexes are plain data ([`webhook_request_indexes`]), the
//! backend is hidden behind the [`SchemaCatalog`] trait, and
//! [`SchemaInitializer`] plans and applies the difference.

pub mod config;
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod mongo;
pub mod service;
pub mod types;
pub mod utils;

pub use config::{
    webhook_request_indexes, SchemaTarget, DEFAULT_COLLECTION_NAME, DEFAULT_DATABASE_NAME,
};
pub use errors::InitError;
pub use interfaces::SchemaCatalog;
pub use memory::{CatalogOp, InMemoryCatalog};
pub use mongo::MongoCatalog;
pub use service::SchemaInitializer;
pub use types::{
    ExistingIndex, FieldPath, IndexAction, IndexOptions, IndexSpec, InitReport, KeyType,
    PlannedIndex, SchemaPlan, SortDirection, WebhookRequest,
};
pub use utils::validate_field_path;
