//! Handlers for `/subscriptions` endpoints — the entitlement store's
//! administrative surface.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subscriptions` | Optional `?user_id=` filter |
//! | `POST`   | `/subscriptions` | Body: [`SubscriptionBody`]; 201 |
//! | `DELETE` | `/subscriptions` | Same body; removes exactly one matching grant |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use geoscope_core::{store::GeoStore, subscription::Subscription};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub user_id: Option<String>,
}

/// `GET /subscriptions[?user_id=<user>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Subscription>>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let subs = store
    .list_subscriptions(params.user_id.as_deref())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(subs))
}

// ─── Grant / revoke ───────────────────────────────────────────────────────────

/// Shared body for grant and revoke. Fields are optional so a missing one
/// yields a descriptive 400 rather than a deserialisation rejection.
#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
  pub user_id:    Option<String>,
  pub product_id: Option<i64>,
}

impl SubscriptionBody {
  fn into_parts(self) -> Result<(String, i64), ApiError> {
    match (self.user_id, self.product_id) {
      (Some(user), Some(product)) => Ok((user, product)),
      _ => Err(ApiError::BadRequest(
        "Missing user_id or product_id".to_string(),
      )),
    }
  }
}

/// `POST /subscriptions` — record a grant. Duplicates are harmless.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<SubscriptionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let (user, product_id) = body.into_parts()?;
  let sub = store
    .add_subscription(&user, product_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(sub)))
}

/// `DELETE /subscriptions` — must match an existing grant on both fields.
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<SubscriptionBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let (user, product_id) = body.into_parts()?;
  let removed = store
    .remove_subscription(&user, product_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if !removed {
    return Err(ApiError::NotFound("Subscription not found".to_string()));
  }
  Ok(Json(json!({ "message": "Subscription cancelled" })))
}
