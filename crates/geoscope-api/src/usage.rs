//! Usage statistics and traffic simulation.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/usage-stats` | Per-minute call counts over the last hour |
//! | `POST` | `/simulate-traffic` | Dev helper: synthesises usage entries and one observation |

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use geoscope_core::{observation::NewObservation, store::GeoStore};
use rand::Rng as _;
use serde_json::json;

use crate::{error::ApiError, log_usage};

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /usage-stats` — chart-ready shape: parallel label/count arrays plus
/// the hour total.
pub async fn stats<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let since = Utc::now() - Duration::hours(1);
  let buckets = store
    .usage_stats(since)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let labels: Vec<String> = buckets.iter().map(|b| b.bucket.clone()).collect();
  let data:   Vec<i64>    = buckets.iter().map(|b| b.count).collect();
  let total:  i64         = data.iter().sum();

  Ok(Json(json!({
    "labels": labels,
    "data": data,
    "total_calls_last_hour": total,
  })))
}

// ─── Traffic simulation ───────────────────────────────────────────────────────

/// `POST /simulate-traffic` — log a burst of usage entries and create one
/// plausible observation so dashboards have data to show.
pub async fn simulate_traffic<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GeoStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  for _ in 0..5 {
    log_usage(store.as_ref(), "GET /api/observations").await;
  }

  // Thread-local RNG must not live across an await point.
  let (product_id, value, confidence) = {
    let mut rng = rand::thread_rng();
    (
      rng.gen_range(1..=4),
      format!("{:.2}", rng.gen_range(0.1..0.9)),
      (rng.gen_range(80.0..99.9_f64) * 10.0).round() / 10.0,
    )
  };

  let input = NewObservation {
    product_id: Some(product_id),
    value:      Some(value),
    unit:       Some("Index".to_string()),
    confidence: Some(confidence),
    notes:      Some("Simulated Data".to_string()),
    ..NewObservation::default()
  };
  store
    .insert_observation(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(json!({ "message": "Traffic simulated successfully", "count": 5 })))
}
