//! Dataset service - filtered keyword search over warehouse tables
//!
//! Orchestrates one request by:
//! - Loading the table's columns (the field allowlist)
//! - Compiling filters and keywords to SQL predicates
//! - Running the paginated data query and its count companion through the cache

use std::collections::BTreeMap;
use std::sync::Arc;

use fedspend_query::{
    assemble, compile_search_with, CacheOptions, ColumnAllowlist, ContractPreset, FilterCompiler,
    FilterSpec, Pagination, ResultCache, Row, SearchOptions, TableName,
};
use serde::{Deserialize, Serialize};

use crate::config::{Config, SearchConfig};
use crate::db::{ColumnInfo, SchemaRepository};
use crate::{Error, Result};

const HEALTH_QUERY: &str = "SELECT version() AS version";
const COUNT_COLUMN: &str = "total_count";

/// A search request after transport decoding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatasetQuery {
    pub filters: FilterSpec,
    pub search_keywords: String,
    pub page: Option<u32>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<u32>,
    pub order_by: Option<String>,
}

/// One page of matching rows.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetPage {
    pub data: Vec<Row>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub execution_time_ms: u64,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DatasetPage {
    fn empty(pagination: Pagination, message: String) -> Self {
        Self {
            data: Vec::new(),
            total_count: 0,
            page: pagination.page(),
            page_size: pagination.page_size(),
            execution_time_ms: 0,
            cached: false,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetMetadata {
    pub dataset: String,
    pub table: String,
    pub presets: bool,
    pub columns: Vec<ColumnInfo>,
}

#[derive(Debug, Clone)]
struct Dataset {
    table: TableName,
    presets: bool,
    order_by: Option<String>,
}

pub struct DatasetService {
    cache: Arc<ResultCache>,
    schema: SchemaRepository,
    datasets: BTreeMap<String, Dataset>,
    search: SearchConfig,
    cache_enabled: bool,
}

impl DatasetService {
    pub fn new(config: &Config, cache: Arc<ResultCache>) -> Result<Self> {
        let mut datasets = BTreeMap::new();
        for (name, dataset) in &config.datasets {
            datasets.insert(
                name.clone(),
                Dataset {
                    table: dataset.table_name()?,
                    presets: dataset.presets,
                    order_by: dataset.order_by.clone(),
                },
            );
        }

        Ok(Self {
            schema: SchemaRepository::new(cache.clone(), config.cache.schema_ttl()),
            cache,
            datasets,
            search: config.search.clone(),
            cache_enabled: config.cache.enabled,
        })
    }

    /// Configured dataset names with their fully qualified table.
    pub fn datasets(&self) -> impl Iterator<Item = (&str, &TableName)> {
        self.datasets
            .iter()
            .map(|(name, dataset)| (name.as_str(), &dataset.table))
    }

    fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| Error::DatasetNotFound(name.to_string()))
    }

    fn pagination(&self, query: &DatasetQuery) -> Result<Pagination> {
        let page = query.page.unwrap_or(1);
        let page_size = query.page_size.unwrap_or(self.search.default_page_size);
        Ok(Pagination::new(page, page_size)?.clamped(self.search.max_page_size))
    }

    fn cache_options(&self, dataset: &str) -> CacheOptions {
        let options = CacheOptions::labeled(dataset);
        if self.cache_enabled {
            options
        } else {
            options.bypass()
        }
    }

    /// Run a filtered, paginated search against one dataset.
    pub async fn search(&self, name: &str, query: &DatasetQuery) -> Result<DatasetPage> {
        let dataset = self.dataset(name)?;
        let pagination = self.pagination(query)?;

        let columns = self.schema.columns(&dataset.table).await?;
        if columns.is_empty() {
            tracing::warn!(dataset = name, table = %dataset.table, "No columns found");
            return Ok(DatasetPage::empty(
                pagination,
                format!("No columns found in {name} table"),
            ));
        }
        let allowlist: ColumnAllowlist = columns.into_iter().map(|c| c.name).collect();

        let presets: &[ContractPreset] = if dataset.presets {
            ContractPreset::ALL
        } else {
            &[]
        };
        let filter = FilterCompiler::new(&allowlist)
            .with_presets(presets)
            .compile(&query.filters);
        let search = compile_search_with(
            &query.search_keywords,
            Some(&allowlist),
            SearchOptions::default().with_term_join(self.search.term_join),
        );

        let order_by = query.order_by.as_deref().or(dataset.order_by.as_deref());
        let plan = assemble(
            &dataset.table,
            &filter,
            &search,
            pagination,
            &allowlist,
            order_by,
        );

        let options = self.cache_options(name);
        let count = self
            .cache
            .get_or_execute(&plan.count_query, &[], &options)
            .await?;
        let data = self
            .cache
            .get_or_execute(&plan.data_query, &[], &options)
            .await?;

        let total_count = count.first_i64(COUNT_COLUMN).unwrap_or(0);

        tracing::info!(
            dataset = name,
            page = pagination.page(),
            page_size = pagination.page_size(),
            rows = data.row_count,
            total_count,
            cached = data.cached && count.cached,
            "Dataset search completed"
        );

        Ok(DatasetPage {
            data: data.rows,
            total_count,
            page: pagination.page(),
            page_size: pagination.page_size(),
            execution_time_ms: count.execution_time_ms + data.execution_time_ms,
            cached: data.cached && count.cached,
            message: None,
        })
    }

    pub async fn metadata(&self, name: &str) -> Result<DatasetMetadata> {
        let dataset = self.dataset(name)?;
        let columns = self.schema.columns(&dataset.table).await?;
        Ok(DatasetMetadata {
            dataset: name.to_string(),
            table: dataset.table.to_string(),
            presets: dataset.presets,
            columns,
        })
    }

    /// Round-trip to the warehouse, never served from cache.
    pub async fn warehouse_version(&self) -> Result<Option<String>> {
        let options = CacheOptions::labeled("health").bypass();
        let result = self
            .cache
            .get_or_execute(HEALTH_QUERY, &[], &options)
            .await?;
        Ok(result
            .rows
            .first()
            .and_then(|row| row.get("version"))
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}
