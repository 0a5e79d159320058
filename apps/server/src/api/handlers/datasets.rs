//! Dataset search endpoints
//!
//! `GET` takes filters as query parameters, each value parsed as JSON when it
//! can be (`TYPE=["Award","Grant"]`) and kept as a string otherwise.
//! `POST` takes the same request as a JSON body.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use fedspend_query::FilterSpec;

use crate::{
    services::{DatasetMetadata, DatasetPage, DatasetQuery},
    state::AppState,
    Error, Result,
};

/// Search a dataset (GET /api/datasets/{dataset}?...)
pub async fn search_get(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<DatasetPage>> {
    let query = query_from_pairs(&params)?;
    let page = state.dataset_service.search(&dataset, &query).await?;
    Ok(Json(page))
}

/// Search a dataset (POST /api/datasets/{dataset})
pub async fn search_post(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Json(query): Json<DatasetQuery>,
) -> Result<Json<DatasetPage>> {
    let page = state.dataset_service.search(&dataset, &query).await?;
    Ok(Json(page))
}

/// Column listing for a dataset (GET /api/datasets/{dataset}/metadata)
pub async fn metadata(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
) -> Result<Json<DatasetMetadata>> {
    Ok(Json(state.dataset_service.metadata(&dataset).await?))
}

pub(crate) fn query_from_pairs(pairs: &[(String, String)]) -> Result<DatasetQuery> {
    let mut query = DatasetQuery {
        filters: FilterSpec::from_query_pairs(pairs.iter().map(|(k, v)| (k, v))),
        ..DatasetQuery::default()
    };

    for (key, value) in pairs {
        match key.as_str() {
            "page" => query.page = Some(parse_number(key, value)?),
            "page_size" | "pageSize" => query.page_size = Some(parse_number(key, value)?),
            "search_keywords" | "keywords" => query.search_keywords = value.clone(),
            "order_by" => query.order_by = Some(value.clone()),
            _ => {}
        }
    }

    Ok(query)
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{key} must be a positive integer, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_from_pairs_splits_paging_and_filters() {
        let query = query_from_pairs(&pairs(&[
            ("page", "2"),
            ("pageSize", "50"),
            ("keywords", "cyber"),
            ("TYPE", r#"["Award","Grant"]"#),
            ("agency", "Defense"),
            ("has_execution_data", "true"),
        ]))
        .unwrap();

        assert_eq!(query.page, Some(2));
        assert_eq!(query.page_size, Some(50));
        assert_eq!(query.search_keywords, "cyber");
        assert_eq!(query.filters.get("TYPE"), Some(&json!(["Award", "Grant"])));
        assert_eq!(query.filters.get("agency"), Some(&json!("Defense")));
        assert_eq!(query.filters.get("has_execution_data"), Some(&json!(true)));
        assert!(query.filters.get("page").is_none());
        assert!(query.filters.get("keywords").is_none());
    }

    #[test]
    fn test_query_from_pairs_rejects_non_numeric_page() {
        let err = query_from_pairs(&pairs(&[("page", "two")])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
