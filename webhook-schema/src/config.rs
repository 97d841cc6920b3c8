//! Configuration types for the SchemaInitializer.

use crate::errors::InitError;
use crate::types::{FieldPath, IndexOptions, IndexSpec, SortDirection};

/// Default database holding captured webhook requests.
pub const DEFAULT_DATABASE_NAME: &str = "webhook_db";

/// Default collection holding captured webhook requests.
pub const DEFAULT_COLLECTION_NAME: &str = "webhook_requests";

/// The secondary indexes the webhook request collection needs, in order.
///
/// - `{timestamp: -1}` for newest-first listing
/// - `{method: 1}` and `{path: 1}` for filtering
/// - `{"headers.x-signature": 1}` for signature lookups
pub fn webhook_request_indexes() -> Vec<IndexSpec> {
    [
        ("timestamp", SortDirection::Descending),
        ("method", SortDirection::Ascending),
        ("path", SortDirection::Ascending),
        ("headers.x-signature", SortDirection::Ascending),
    ]
    .into_iter()
    .map(|(field, direction)| IndexSpec {
        keys: vec![(FieldPath::from_static(field), direction)],
        options: IndexOptions::default(),
    })
    .collect()
}

/// What the initializer should make exist: a database, one collection in it,
/// and an ordered list of indexes on that collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTarget {
    pub database: String,
    pub collection: String,
    pub indexes: Vec<IndexSpec>,
}

impl Default for SchemaTarget {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_NAME, DEFAULT_COLLECTION_NAME)
    }
}

impl SchemaTarget {
    /// Target the given database and collection with the webhook request indexes.
    ///
    /// # Arguments
    ///
    /// * `database` - The database name
    /// * `collection` - The collection name
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
            indexes: webhook_request_indexes(),
        }
    }

    /// Replace the desired index list.
    pub fn with_indexes(mut self, indexes: Vec<IndexSpec>) -> Self {
        self.indexes = indexes;
        self
    }

    /// Validate names and every index spec, and reject two specs resolving to
    /// the same index name.
    pub fn validate(&self) -> Result<(), InitError> {
        validate_namespace_part("database", &self.database)?;
        validate_namespace_part("collection", &self.collection)?;
        if self.collection.starts_with("system.") {
            return Err(InitError::validation(format!(
                "Collection name '{}' is reserved",
                self.collection
            )));
        }

        for (i, spec) in self.indexes.iter().enumerate() {
            spec.validate()?;
            let name = spec.name();
            if self.indexes[..i].iter().any(|other| other.name() == name) {
                return Err(InitError::validation(format!(
                    "Index '{}' is listed more than once",
                    name
                )));
            }
        }
        Ok(())
    }
}

fn validate_namespace_part(kind: &str, name: &str) -> Result<(), InitError> {
    if name.is_empty() {
        return Err(InitError::validation(format!("{} name cannot be empty", kind)));
    }
    let forbidden_in_database = kind == "database" && name.contains(['.', '/', '\\', ' ', '"']);
    if name.contains(['\0', '$']) || forbidden_in_database {
        return Err(InitError::validation(format!(
            "{} name '{}' contains invalid characters",
            kind,
            name.escape_default()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_request_indexes() {
        let names: Vec<String> = webhook_request_indexes().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["timestamp_-1", "method_1", "path_1", "headers.x-signature_1"]
        );

        let timestamp = &webhook_request_indexes()[0];
        assert_eq!(timestamp.keys[0].1, SortDirection::Descending);
        assert!(!timestamp.options.unique);
    }

    #[test]
    fn test_default_target() {
        let target = SchemaTarget::default();
        assert_eq!(target.database, "webhook_db");
        assert_eq!(target.collection, "webhook_requests");
        assert_eq!(target.indexes.len(), 4);
        assert!(target.validate().is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(SchemaTarget::new("", "webhook_requests").validate().is_err());
        assert!(SchemaTarget::new("webhook.db", "webhook_requests").validate().is_err());
        assert!(SchemaTarget::new("webhook_db", "").validate().is_err());
        assert!(SchemaTarget::new("webhook_db", "system.views").validate().is_err());
        assert!(SchemaTarget::new("webhook_db", "$cmd").validate().is_err());
    }

    #[test]
    fn test_duplicate_index_names_rejected() {
        let mut indexes = webhook_request_indexes();
        indexes.push(indexes[1].clone());
        let target = SchemaTarget::default().with_indexes(indexes);
        assert!(matches!(
            target.validate(),
            Err(InitError::ValidationError(_))
        ));
    }
}
