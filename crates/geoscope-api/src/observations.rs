//! Handlers for `/observations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/observations` | Body: [`CreateBody`]; 201 + `{"id": N}`; unauthenticated |
//! | `GET`    | `/observations` | Bearer identity required; entitlement-filtered, newest first |
//! | `GET`    | `/observations/:id` | Bearer identity required; 404 / 403 |
//! | `PUT`    | `/observations/:id` | Allow-listed partial update; no entitlement check |
//! | `DELETE` | `/observations/:id` | No entitlement check |
//! | `GET`    | `/observations/filter` | Allow-listed equality filters; unauthenticated |

use std::{collections::BTreeSet, sync::Arc};

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use geoscope_core::{
  observation::{NewObservation, ObservationPatch, ObservationView},
  service::ObservationService,
  store::{GeoStore, ObservationQuery},
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::ApiError, identity::CallerIdentity, log_usage};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /observations`. Only these fields are
/// honoured at creation; everything else (unit, notes, geo metadata)
/// arrives via update. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub product_id: Option<i64>,
  pub value:      Option<String>,
  pub timestamp:  Option<DateTime<Utc>>,
  pub confidence: Option<f64>,
}

impl From<CreateBody> for NewObservation {
  fn from(b: CreateBody) -> Self {
    NewObservation {
      product_id: b.product_id,
      value:      b.value,
      timestamp:  b.timestamp,
      confidence: b.confidence,
      ..NewObservation::default()
    }
  }
}

/// `POST /observations` — returns 201 + the assigned id. Creation is
/// unauthenticated and carries no entitlement check.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let service = ObservationService::new(store.clone());
  let id = service.create(NewObservation::from(body)).await?;

  log_usage(store.as_ref(), "POST /api/observations").await;

  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /observations` — the caller-visible subset, newest first. A caller
/// with no subscriptions gets `[]`, not an error.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  CallerIdentity(user): CallerIdentity,
) -> Result<Json<Vec<ObservationView>>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let service = ObservationService::new(store.clone());
  let views = service.list_visible(&user).await?;

  log_usage(store.as_ref(), "GET /api/observations").await;

  Ok(Json(views))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /observations/:id` — 404 when absent, 403 when the caller holds
/// neither the owning grant nor the universal one.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  CallerIdentity(user): CallerIdentity,
  Path(id): Path<i64>,
) -> Result<Json<ObservationView>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let service = ObservationService::new(store.clone());
  let view = service.get_visible(&user, id).await?;

  // Denied requests are deliberately not logged.
  log_usage(store.as_ref(), "GET /api/observations/:id").await;

  Ok(Json(view))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /observations/:id` — allow-listed partial update; unknown keys are
/// ignored. Writes carry no entitlement check.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
  Json(patch): Json<ObservationPatch>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let service = ObservationService::new(store.clone());
  service.update(id, patch).await?;

  log_usage(store.as_ref(), "PUT /api/observations/:id").await;

  Ok(Json(json!({ "message": "Updated" })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /observations/:id` — no entitlement check.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let service = ObservationService::new(store.clone());
  service.delete(id).await?;

  log_usage(store.as_ref(), "DELETE /api/observations/:id").await;

  Ok(Json(json!({ "message": "Deleted" })))
}

// ─── Filter ───────────────────────────────────────────────────────────────────

/// Allow-listed equality filters; unknown query parameters are ignored
/// rather than rejected.
#[derive(Debug, Deserialize, Default)]
pub struct FilterParams {
  pub product_id:   Option<i64>,
  pub satellite_id: Option<String>,
  pub unit:         Option<String>,
  pub timezone:     Option<String>,
}

/// `GET /observations/filter[?product_id=...][&satellite_id=...][&unit=...][&timezone=...]`
pub async fn filtered<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<FilterParams>,
) -> Result<Json<Vec<ObservationView>>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = ObservationQuery {
    product_ids:  params.product_id.map(|id| BTreeSet::from([id])),
    satellite_id: params.satellite_id,
    unit:         params.unit,
    timezone:     params.timezone,
    ..Default::default()
  };

  let service = ObservationService::new(store.clone());
  Ok(Json(service.filter(&query).await?))
}
