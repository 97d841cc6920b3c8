//! MongoDB catalog implementation.
//!
//! This module provides the concrete implementation of `SchemaCatalog`
//! using the MongoDB Rust driver.

use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, IndexModel};
use tracing::{debug, info};

use crate::errors::{command_code, InitError, CODE_NAMESPACE_EXISTS, CODE_NAMESPACE_NOT_FOUND};
use crate::interfaces::SchemaCatalog;
use crate::mongo::index_model::{existing_index_from_model, index_model_from_spec};
use crate::types::{ExistingIndex, IndexSpec};

/// Application name reported to the server in connection handshakes.
const APP_NAME: &str = "webhook-schema-init";

/// MongoDB catalog implementation.
///
/// Owns a driver `Client` for the duration of one initialization run.
///
/// # Example
///
/// ```ignore
/// let catalog = MongoCatalog::connect("mongodb://localhost:27017", Duration::from_secs(10)).await?;
/// catalog.ping().await?;
/// let indexes = catalog.list_indexes("webhook_db", "webhook_requests").await?;
/// catalog.close().await;
/// ```
pub struct MongoCatalog {
    client: Client,
}

impl MongoCatalog {
    /// Create a catalog for the server at `uri`.
    ///
    /// The driver connects lazily; the first command (usually `ping`) is where an
    /// unreachable server shows up. `timeout` bounds server selection and the
    /// initial TCP connect.
    ///
    /// # Arguments
    ///
    /// * `uri` - The MongoDB connection string (e.g., "mongodb://localhost:27017")
    /// * `timeout` - Server selection and connect timeout
    ///
    /// # Returns
    ///
    /// * `Ok(MongoCatalog)` - A new catalog instance
    /// * `Err(InitError)` - If the connection string is invalid or unresolvable
    pub async fn connect(uri: &str, timeout: Duration) -> Result<Self, InitError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        if options.app_name.is_none() {
            options.app_name = Some(APP_NAME.to_string());
        }

        let hosts: Vec<String> = options.hosts.iter().map(|h| h.to_string()).collect();
        let client = Client::with_options(options)?;

        info!(
            hosts = ?hosts,
            timeout_secs = timeout.as_secs(),
            "Created MongoDB catalog"
        );

        Ok(Self { client })
    }

    fn collection(&self, database: &str, collection: &str) -> mongodb::Collection<Document> {
        self.client.database(database).collection::<Document>(collection)
    }
}

#[async_trait]
impl SchemaCatalog for MongoCatalog {
    async fn ping(&self) -> Result<(), InitError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!("MongoDB answered ping");
        Ok(())
    }

    async fn collection_exists(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError> {
        let names = self
            .client
            .database(database)
            .list_collection_names()
            .filter(doc! { "name": collection })
            .await?;
        Ok(names.iter().any(|name| name == collection))
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<bool, InitError> {
        match self
            .client
            .database(database)
            .create_collection(collection)
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if command_code(&e) == Some(CODE_NAMESPACE_EXISTS) => {
                debug!(database = %database, collection = %collection, "Collection already exists");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_indexes(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Vec<ExistingIndex>, InitError> {
        let cursor = match self.collection(database, collection).list_indexes().await {
            Ok(cursor) => cursor,
            Err(e) if command_code(&e) == Some(CODE_NAMESPACE_NOT_FOUND) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let models: Vec<IndexModel> = cursor.try_collect().await?;
        Ok(models.iter().map(existing_index_from_model).collect())
    }

    async fn create_index(
        &self,
        database: &str,
        collection: &str,
        spec: &IndexSpec,
    ) -> Result<String, InitError> {
        let name = spec.name();
        let model = index_model_from_spec(spec);

        match self.collection(database, collection).create_index(model).await {
            Ok(result) => Ok(result.index_name),
            Err(e) => match command_code(&e) {
                Some(code) => Err(InitError::from_command_code(
                    code,
                    &e.to_string(),
                    Some(&name),
                )),
                None => Err(e.into()),
            },
        }
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        debug!("MongoDB client shut down");
    }
}
