//! Schema initializer service.
//!
//! This module provides the routine that brings a database catalog to the
//! desired schema. It first plans against the existing indexes, refuses to
//! touch anything when a definition conflicts, then creates what is missing
//! and verifies the result.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SchemaTarget;
use crate::errors::InitError;
use crate::interfaces::SchemaCatalog;
use crate::types::{ExistingIndex, IndexAction, IndexSpec, InitReport, PlannedIndex, SchemaPlan};

/// Applies a `SchemaTarget` to a catalog, idempotently.
///
/// Running `initialize` any number of times leaves the catalog in the same
/// state as running it once. No document is read, modified or deleted.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use webhook_schema::{MongoCatalog, SchemaInitializer, SchemaTarget};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = MongoCatalog::connect("mongodb://localhost:27017", Duration::from_secs(10)).await?;
/// let initializer = SchemaInitializer::new(Arc::new(catalog), SchemaTarget::default());
///
/// let report = initializer.initialize().await?;
/// println!("created {} indexes", report.created.len());
/// # Ok(())
/// # }
/// ```
pub struct SchemaInitializer {
    catalog: Arc<dyn SchemaCatalog>,
    target: SchemaTarget,
}

impl SchemaInitializer {
    /// Create a new initializer.
    ///
    /// # Arguments
    ///
    /// * `catalog` - The catalog to apply the schema to (e.g., `MongoCatalog`)
    /// * `target` - Database, collection and desired indexes
    pub fn new(catalog: Arc<dyn SchemaCatalog>, target: SchemaTarget) -> Self {
        Self { catalog, target }
    }

    pub fn target(&self) -> &SchemaTarget {
        &self.target
    }

    /// Compare the desired schema with the catalog without changing anything.
    ///
    /// # Returns
    ///
    /// * `Ok(SchemaPlan)` - What `initialize` would do
    /// * `Err(InitError::SchemaConflictError)` - If an existing index conflicts
    /// * `Err(InitError)` - If the target is invalid or the catalog fails
    pub async fn plan(&self) -> Result<SchemaPlan, InitError> {
        self.target.validate()?;
        self.catalog.ping().await?;

        let database = &self.target.database;
        let collection = &self.target.collection;

        let collection_exists = self.catalog.collection_exists(database, collection).await?;
        let existing = if collection_exists {
            self.catalog.list_indexes(database, collection).await?
        } else {
            Vec::new()
        };

        debug!(
            database = %database,
            collection = %collection,
            collection_exists,
            existing_indexes = existing.len(),
            "Read current schema"
        );

        let mut indexes = Vec::with_capacity(self.target.indexes.len());
        for spec in &self.target.indexes {
            let action = plan_index(spec, &existing)?;
            indexes.push(PlannedIndex {
                spec: spec.clone(),
                action,
            });
        }

        Ok(SchemaPlan {
            database: database.clone(),
            collection: collection.clone(),
            collection_exists,
            indexes,
        })
    }

    /// Ensure the collection and every desired index exist.
    ///
    /// Conflicts are detected for all indexes before the first change, so a
    /// conflicting definition aborts the run with the catalog untouched.
    ///
    /// # Returns
    ///
    /// * `Ok(InitReport)` - What was created and what was already present
    /// * `Err(InitError)` - On the first failure; nothing is retried
    pub async fn initialize(&self) -> Result<InitReport, InitError> {
        let plan = match self.plan().await {
            Ok(plan) => plan,
            Err(e @ InitError::SchemaConflictError { .. }) => {
                warn!(error = %e, "Existing schema conflicts with the desired one");
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let database = &plan.database;
        let collection = &plan.collection;

        let collection_created = if plan.collection_exists {
            false
        } else {
            self.catalog.create_collection(database, collection).await?
        };
        if collection_created {
            info!(database = %database, collection = %collection, "Created collection");
        }

        let mut created = Vec::new();
        let mut already_present = Vec::new();
        for planned in &plan.indexes {
            match &planned.action {
                IndexAction::Create => {
                    let name = self
                        .catalog
                        .create_index(database, collection, &planned.spec)
                        .await?;
                    info!(index = %name, collection = %collection, "Created index");
                    created.push(name);
                }
                IndexAction::AlreadyPresent { existing_name } => {
                    debug!(index = %existing_name, "Index already present");
                    already_present.push(existing_name.clone());
                }
            }
        }

        self.verify().await?;

        info!(
            database = %database,
            collection = %collection,
            collection_created,
            indexes_created = created.len(),
            indexes_present = already_present.len(),
            "Database initialized successfully"
        );

        Ok(InitReport {
            database: database.clone(),
            collection: collection.clone(),
            collection_created,
            created,
            already_present,
        })
    }

    /// Re-read the indexes and check every desired one is there.
    async fn verify(&self) -> Result<(), InitError> {
        let existing = self
            .catalog
            .list_indexes(&self.target.database, &self.target.collection)
            .await?;

        for spec in &self.target.indexes {
            let present = existing
                .iter()
                .any(|index| index.has_same_keys(spec) && index.has_same_options(spec));
            if !present {
                return Err(InitError::schema_conflict(
                    spec.name(),
                    "index is missing after creation",
                ));
            }
        }

        debug!(total_indexes = existing.len(), "Verified indexes");
        Ok(())
    }
}

/// Decide what to do for one desired index given the existing ones.
///
/// The primary-key index is ignored. An equivalent index under another name
/// counts as present. Same name with another definition, same keys with other
/// options, or the same fields in other directions is a conflict.
fn plan_index(spec: &IndexSpec, existing: &[ExistingIndex]) -> Result<IndexAction, InitError> {
    let name = spec.name();
    let wanted = ExistingIndex::from_spec(spec);
    let candidates = || existing.iter().filter(|index| !index.is_primary_key());

    let conflict = |found: &ExistingIndex, what: &str| {
        InitError::schema_conflict(
            &name,
            format!(
                "{}: existing index '{}' is {} {}, wanted {} {}",
                what,
                found.name,
                found.describe_keys(),
                found.describe_options(),
                wanted.describe_keys(),
                wanted.describe_options()
            ),
        )
    };

    if let Some(found) = candidates().find(|index| index.name == name) {
        if found.has_same_keys(spec) && found.has_same_options(spec) {
            return Ok(IndexAction::AlreadyPresent {
                existing_name: found.name.clone(),
            });
        }
        return Err(conflict(found, "same name, different definition"));
    }

    if let Some(found) = candidates().find(|index| index.has_same_keys(spec)) {
        if found.has_same_options(spec) {
            return Ok(IndexAction::AlreadyPresent {
                existing_name: found.name.clone(),
            });
        }
        return Err(conflict(found, "same keys, different options"));
    }

    if let Some(found) = candidates().find(|index| index.has_same_fields(spec)) {
        return Err(conflict(found, "same fields, different directions"));
    }

    Ok(IndexAction::Create)
}
