//! JSON REST API for GeoScope.
//!
//! Exposes an axum [`Router`] backed by any
//! [`geoscope_core::store::GeoStore`]. Transport concerns (TLS, the `/api`
//! mount point, request tracing) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", geoscope_api::api_router(store.clone()))
//! ```

pub mod bulk;
pub mod error;
pub mod identity;
pub mod observations;
pub mod products;
pub mod subscriptions;
pub mod usage;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use geoscope_core::store::GeoStore;

pub use error::ApiError;
pub use identity::CallerIdentity;

#[cfg(test)]
mod tests;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: GeoStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Observations
    .route(
      "/observations",
      get(observations::list::<S>).post(observations::create::<S>),
    )
    .route("/observations/filter", get(observations::filtered::<S>))
    .route(
      "/observations/{id}",
      get(observations::get_one::<S>)
        .put(observations::update_one::<S>)
        .delete(observations::delete_one::<S>),
    )
    // Catalog & entitlements
    .route("/products", get(products::list::<S>))
    .route(
      "/subscriptions",
      get(subscriptions::list::<S>)
        .post(subscriptions::create::<S>)
        .delete(subscriptions::remove::<S>),
    )
    // Usage log
    .route("/usage-stats", get(usage::stats::<S>))
    .route("/simulate-traffic", post(usage::simulate_traffic::<S>))
    // Bulk retrieval
    .route("/v1/bulk/insights", get(bulk::insights::<S>))
    .route("/health", get(health))
    .with_state(store)
}

/// `GET /health`
async fn health() -> Json<serde_json::Value> {
  Json(serde_json::json!({ "status": "ok" }))
}

/// Best-effort usage logging: failures never fail the request.
pub(crate) async fn log_usage<S: GeoStore>(store: &S, endpoint: &str) {
  if let Err(e) = store.log_usage(endpoint).await {
    tracing::warn!(endpoint, error = %e, "failed to log api usage");
  }
}
