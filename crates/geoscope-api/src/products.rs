//! Handler for `GET /products` — the immutable catalog.

use std::sync::Arc;

use axum::{Json, extract::State};
use geoscope_core::{product::Product, store::GeoStore};

use crate::error::ApiError;

/// `GET /products`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let products = store
    .list_products()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(products))
}
