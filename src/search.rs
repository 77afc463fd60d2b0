//! Document search: service call, normalization, local filtering.
//!
//! The search service only ranks; [`search_documents`] always re-applies the
//! caller's [`FilterCriteria`] locally on the normalized hits.

use serde_json::json;

use crate::config::SearchConfig;
use crate::error::{ActionError, QueryError};
use crate::filter::filter_hits;
use crate::models::{FilterCriteria, SearchHit};
use crate::normalize::normalize;
use crate::warehouse::{SqlParam, Warehouse};

pub const EMPTY_QUERY: &str = "Enter a search query first.";

const SEARCH_PREVIEW_SQL: &str = "SELECT SNOWFLAKE.CORTEX.SEARCH_PREVIEW(?, ?) AS RESULT";

/// One search action: query text, result cap, and local filters.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub query: String,
    /// `None` uses `search.default_limit`.
    pub limit: Option<u32>,
    pub criteria: FilterCriteria,
}

/// Validates the request, queries the service, and filters the hits locally.
pub async fn search_documents(
    warehouse: &dyn Warehouse,
    config: &SearchConfig,
    request: &SearchRequest,
) -> Result<Vec<SearchHit>, ActionError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(ActionError::input(EMPTY_QUERY));
    }

    let limit = effective_limit(config, request.limit);
    let hits = run_search_service(warehouse, &config.service, query, limit, &config.columns).await?;
    let fetched = hits.len();
    let hits = filter_hits(hits, &request.criteria);

    tracing::info!(
        service = %config.service,
        limit,
        fetched,
        kept = hits.len(),
        "search finished"
    );
    Ok(hits)
}

/// Calls the search-preview function and normalizes its payload.
pub async fn run_search_service(
    warehouse: &dyn Warehouse,
    service: &str,
    query: &str,
    limit: u32,
    columns: &[String],
) -> Result<Vec<SearchHit>, QueryError> {
    let request = json!({
        "query": query,
        "limit": limit,
        "columns": columns,
    });
    let params = [SqlParam::from(service), SqlParam::from(request.to_string())];

    match warehouse.scalar(SEARCH_PREVIEW_SQL, &params).await? {
        Some(raw) => Ok(normalize(&raw)),
        None => Ok(Vec::new()),
    }
}

/// Clamps a requested limit into `1..=max_limit`.
pub fn effective_limit(config: &SearchConfig, requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(config.default_limit)
        .clamp(1, config.max_limit.max(1))
}

/// Distinct non-empty relative paths in first-seen order, for a preview picker.
pub fn preview_paths(hits: &[SearchHit]) -> Vec<&str> {
    let mut paths: Vec<&str> = Vec::new();
    for path in hits.iter().filter_map(|h| h.relative_path.as_deref()) {
        if !path.is_empty() && !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}
