//! Shared application state

use std::sync::Arc;

use fedspend_query::{QueryExecutor, ResultCache};

use crate::config::Config;
use crate::db::PgWarehouse;
use crate::services::DatasetService;
use crate::Result;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ResultCache>,
    pub dataset_service: Arc<DatasetService>,
}

impl AppState {
    /// Connect to the warehouse and build services on top of it.
    pub async fn new(config: Config) -> Result<Self> {
        let warehouse = PgWarehouse::connect(&config.database).await?;
        Self::with_executor(config, Arc::new(warehouse))
    }

    /// Build state around any executor. Tests pass an in-memory stub here.
    pub fn with_executor(config: Config, executor: Arc<dyn QueryExecutor>) -> Result<Self> {
        let cache = Arc::new(ResultCache::new(executor, config.cache.engine_config()));
        let dataset_service = Arc::new(DatasetService::new(&config, cache.clone())?);

        Ok(Self {
            config: Arc::new(config),
            cache,
            dataset_service,
        })
    }
}
