//! Schema catalog trait definition.
//!
//! This module defines the abstract interface to a database server's catalog:
//! the small set of "ensure exists" operations the initializer needs.

use async_trait::async_trait;

use crate::errors::InitError;
use crate::types::{ExistingIndex, IndexSpec};

/// Abstracts the database server the schema is applied to (MongoDB, in-memory, etc.).
///
/// Implementations are injected into `SchemaInitializer`. Every mutating
/// operation has create-if-absent semantics: asking for something that already
/// exists in an equivalent form is not an error.
///
/// None of these operations reads, modifies or deletes documents.
#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    /// Check the server is reachable.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the server answered
    /// * `Err(InitError::ConnectionError)` - If it could not be reached
    async fn ping(&self) -> Result<(), InitError>;

    /// Whether the collection exists in the database.
    async fn collection_exists(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError>;

    /// Create the collection unless it already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the collection was created by this call
    /// * `Ok(false)` - If it already existed
    /// * `Err(InitError)` - If creation failed
    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError>;

    /// List the indexes of a collection, including the primary-key index.
    ///
    /// A collection that does not exist has no indexes; this is not an error.
    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<ExistingIndex>, InitError>;

    /// Create an index unless an equivalent one already exists.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The name of the created (or already present) index
    /// * `Err(InitError::SchemaConflictError)` - If an index with the same name or
    ///   keys exists with a different definition
    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String, InitError>;

    /// Release the connection. Called once, on every exit path.
    async fn close(&self) {}
}
