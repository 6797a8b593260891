//! Bulk retrieval — fetch many observations in one request.
//!
//! `GET /v1/bulk/insights?ids=1,2,3` returns the found records plus a
//! per-id failure entry for everything that matched nothing, with counts.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use geoscope_core::{service::ObservationService, store::GeoStore};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct BulkParams {
  pub ids: Option<String>,
}

/// `GET /v1/bulk/insights?ids=<comma-separated>`
pub async fn insights<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<BulkParams>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let ids_param = params.ids.ok_or_else(|| {
    ApiError::BadRequest(
      "Please provide a comma-separated list of IDs in the 'ids' query parameter."
        .to_string(),
    )
  })?;

  let ids = ids_param
    .split(',')
    .map(|part| part.trim().parse::<i64>())
    .collect::<Result<Vec<i64>, _>>()
    .map_err(|_| ApiError::BadRequest("IDs must be numeric.".to_string()))?;

  let service = ObservationService::new(store.clone());
  let (results, missing) = service.fetch_many(&ids).await?;

  let found = results.len();
  let failures: Vec<serde_json::Value> = missing
    .iter()
    .map(|id| json!({ "id": id, "error": "Record not found" }))
    .collect();

  Ok(Json(json!({
    "results": results,
    "metadata": {
      "total_requested": ids.len(),
      "found": found,
      "failed_count": failures.len(),
      "failures": failures,
    }
  })))
}
