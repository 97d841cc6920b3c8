//! In-memory implementation of the schema catalog.
//!
//! Mirrors the server behaviour the initializer relies on: a new collection
//! gets the `_id_` index, `create_index` implicitly creates its collection,
//! and creating an index that clashes with an existing definition fails.
//! Failures can be injected per operation, and every mutation is counted so
//! callers can assert that nothing changed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::errors::InitError;
use crate::interfaces::SchemaCatalog;
use crate::types::{ExistingIndex, IndexSpec};

/// Catalog operations, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOp {
    Ping,
    CollectionExists,
    CreateCollection,
    ListIndexes,
    CreateIndex,
}

#[derive(Debug, Default)]
struct CollectionState {
    indexes: Vec<ExistingIndex>,
    documents: usize,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            indexes: vec![ExistingIndex::primary_key()],
            documents: 0,
        }
    }
}

type Namespace = (String, String);

fn namespace(database: &str, collection: &str) -> Namespace {
    (database.to_string(), collection.to_string())
}

/// A catalog kept entirely in process memory.
///
/// # Example
///
/// ```
/// use webhook_schema::{InMemoryCatalog, SchemaInitializer, SchemaTarget};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), webhook_schema::InitError> {
/// let catalog = Arc::new(InMemoryCatalog::new());
/// let initializer = SchemaInitializer::new(catalog.clone(), SchemaTarget::default());
/// initializer.initialize().await?;
/// assert_eq!(catalog.indexes("webhook_db", "webhook_requests").await.len(), 5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    collections: Mutex<HashMap<Namespace, CollectionState>>,
    failures: Mutex<HashMap<CatalogOp, InitError>>,
    mutations: AtomicUsize,
    closed: AtomicBool,
}

impl InMemoryCatalog {
    /// Create an empty catalog: no databases, no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing collection holding `documents` documents.
    pub fn with_collection(mut self, database: &str, collection: &str, documents: usize) -> Self {
        self.collections
            .get_mut()
            .entry(namespace(database, collection))
            .or_insert_with(CollectionState::new)
            .documents = documents;
        self
    }

    /// Seed an existing index, creating its collection if needed.
    pub fn with_index(mut self, database: &str, collection: &str, index: ExistingIndex) -> Self {
        self.collections
            .get_mut()
            .entry(namespace(database, collection))
            .or_insert_with(CollectionState::new)
            .indexes
            .push(index);
        self
    }

    /// Make every call to `op` fail with `error`.
    pub fn with_failure(mut self, op: CatalogOp, error: InitError) -> Self {
        self.failures.get_mut().insert(op, error);
        self
    }

    /// Current indexes of a collection, primary key included.
    pub async fn indexes(&self, database: &str, collection: &str) -> Vec<ExistingIndex> {
        self.collections
            .lock()
            .await
            .get(&namespace(database, collection))
            .map(|state| state.indexes.clone())
            .unwrap_or_default()
    }

    /// Number of documents in a collection; zero if it does not exist.
    pub async fn document_count(&self, database: &str, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(&namespace(database, collection))
            .map(|state| state.documents)
            .unwrap_or(0)
    }

    /// Number of catalog changes made through the `SchemaCatalog` interface.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn check_failure(&self, op: CatalogOp) -> Result<(), InitError> {
        match self.failures.lock().await.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SchemaCatalog for InMemoryCatalog {
    async fn ping(&self) -> Result<(), InitError> {
        self.check_failure(CatalogOp::Ping).await
    }

    async fn collection_exists(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError> {
        self.check_failure(CatalogOp::CollectionExists).await?;
        Ok(self
            .collections
            .lock()
            .await
            .contains_key(&namespace(database, collection)))
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError> {
        self.check_failure(CatalogOp::CreateCollection).await?;
        let mut collections = self.collections.lock().await;
        let key = namespace(database, collection);
        if collections.contains_key(&key) {
            return Ok(false);
        }
        collections.insert(key, CollectionState::new());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<ExistingIndex>, InitError> {
        self.check_failure(CatalogOp::ListIndexes).await?;
        Ok(self.indexes(database, collection).await)
    }

    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String, InitError> {
        self.check_failure(CatalogOp::CreateIndex).await?;
        let name = spec.name();
        let mut collections = self.collections.lock().await;
        let key = namespace(database, collection);
        if !collections.contains_key(&key) {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        let state = collections.entry(key).or_insert_with(CollectionState::new);

        if let Some(existing) = state.indexes.iter().find(|index| index.name == name) {
            if !existing.has_same_keys(spec) {
                return Err(InitError::schema_conflict(
                    &name,
                    "An existing index has the same name as the requested index but different keys",
                ));
            }
            if !existing.has_same_options(spec) {
                return Err(InitError::schema_conflict(
                    &name,
                    "An existing index has the same name as the requested index but different options",
                ));
            }
            return Ok(name);
        }

        if let Some(existing) = state.indexes.iter().find(|index| index.has_same_keys(spec)) {
            return Err(InitError::schema_conflict(
                &name,
                format!(
                    "Index already exists with a different name: {}",
                    existing.name
                ),
            ));
        }

        state.indexes.push(ExistingIndex::from_spec(spec));
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(name)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
