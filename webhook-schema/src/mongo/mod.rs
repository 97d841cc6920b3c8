//! MongoDB implementation of the schema catalog.
//!
//! This module provides a concrete implementation of `SchemaCatalog`
//! using the official MongoDB driver.

mod catalog;
mod index_model;

pub use catalog::MongoCatalog;
pub use index_model::{existing_index_from_model, index_model_from_spec, keys_document};
