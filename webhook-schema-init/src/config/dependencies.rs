//! Dependency initialization and wiring for the schema init run.

use std::sync::Arc;

use tracing::info;
use webhook_schema::{MongoCatalog, SchemaCatalog, SchemaInitializer};

use crate::config::settings::{redact_url, InitConfig};
use crate::errors::BootstrapError;

/// Container for all initialized dependencies.
///
/// The catalog handle is kept next to the initializer so the runner can
/// close it once the run is over, whatever the outcome.
pub struct Dependencies {
    /// The catalog the schema is applied to.
    pub catalog: Arc<dyn SchemaCatalog>,
    /// The initializer bound to that catalog and the configured target.
    pub initializer: SchemaInitializer,
}

impl Dependencies {
    /// Connect to MongoDB and build the initializer.
    ///
    /// There is no retry: an unusable connection string fails here, an
    /// unreachable server fails on the first command of the run.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(BootstrapError)` - If the MongoDB client cannot be created
    pub async fn new(config: &InitConfig) -> Result<Self, BootstrapError> {
        info!(
            mongodb_url = %redact_url(&config.mongodb_url),
            database = %config.database_name,
            collection = %config.collection_name,
            mode = ?config.mode,
            timeout_secs = config.mongodb_timeout.as_secs(),
            "Initializing dependencies"
        );

        let catalog = MongoCatalog::connect(&config.mongodb_url, config.mongodb_timeout).await?;

        Ok(Self::with_catalog(config, Arc::new(catalog)))
    }

    /// Build the initializer on top of an existing catalog.
    pub fn with_catalog(config: &InitConfig, catalog: Arc<dyn SchemaCatalog>) -> Self {
        let initializer = SchemaInitializer::new(catalog.clone(), config.target());
        Self {
            catalog,
            initializer,
        }
    }
}
