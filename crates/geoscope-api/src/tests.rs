//! Router-level tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use geoscope_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn router() -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  api_router(Arc::new(store))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

fn get_as(uri: &str, user: Option<&str>) -> Request<Body> {
  let mut builder = Request::builder().method("GET").uri(uri);
  if let Some(u) = user {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {u}"));
  }
  builder.body(Body::empty()).unwrap()
}

async fn grant(app: &Router, user: &str, product_id: i64) {
  let (status, _) = send(
    app,
    json_request(
      "POST",
      "/subscriptions",
      json!({ "user_id": user, "product_id": product_id }),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

async fn create_observation(app: &Router, body: Value) -> i64 {
  let (status, json) = send(app, json_request("POST", "/observations", body)).await;
  assert_eq!(status, StatusCode::CREATED);
  json["id"].as_i64().unwrap()
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_requires_a_bearer_identity() {
  let app = router().await;

  let (status, _) = send(&app, get_as("/observations", None)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  // A non-bearer scheme is rejected too.
  let req = Request::builder()
    .method("GET")
    .uri("/observations")
    .header(header::AUTHORIZATION, "Basic YWxpY2U6cHc=")
    .body(Body::empty())
    .unwrap();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Observations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn grants_gate_reads_end_to_end() {
  let app = router().await;
  grant(&app, "alice", 1).await;

  let id =
    create_observation(&app, json!({ "product_id": 1, "value": "0.5" })).await;

  // alice holds the grant: 200, with the fallback display name (no catalog
  // rows seeded here).
  let (status, body) =
    send(&app, get_as(&format!("/observations/{id}"), Some("alice"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["value"], "0.5");
  assert_eq!(body["product_name"], "Product #1");

  // bob holds nothing: loud deny on single fetch…
  let (status, body) =
    send(&app, get_as(&format!("/observations/{id}"), Some("bob"))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(body["error"], "Forbidden: Subscription required");

  // …and silent deny on the listing.
  let (status, body) = send(&app, get_as("/observations", Some("bob"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!([]));
}

#[tokio::test]
async fn listing_returns_newest_first_for_entitled_callers() {
  let app = router().await;
  grant(&app, "alice", 1).await;

  let older = create_observation(
    &app,
    json!({ "product_id": 1, "value": "0.1", "timestamp": "2024-05-01T10:00:00Z" }),
  )
  .await;
  let newer = create_observation(
    &app,
    json!({ "product_id": 1, "value": "0.2", "timestamp": "2024-05-01T11:00:00Z" }),
  )
  .await;

  let (status, body) = send(&app, get_as("/observations", Some("alice"))).await;
  assert_eq!(status, StatusCode::OK);

  let ids: Vec<i64> =
    body.as_array().unwrap().iter().map(|v| v["id"].as_i64().unwrap()).collect();
  assert_eq!(ids, [newer, older]);
}

#[tokio::test]
async fn create_validates_value_presence() {
  let app = router().await;

  let (status, body) =
    send(&app, json_request("POST", "/observations", json!({ "product_id": 1 })))
      .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "value is required");
}

#[tokio::test]
async fn update_and_delete_report_not_found() {
  let app = router().await;

  let (status, body) = send(
    &app,
    json_request("PUT", "/observations/999", json!({ "notes": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["error"], "Not found");

  let req = Request::builder()
    .method("DELETE")
    .uri("/observations/999")
    .body(Body::empty())
    .unwrap();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_applies_partial_fields_without_identity() {
  let app = router().await;
  let id =
    create_observation(&app, json!({ "product_id": 1, "value": "0.5" })).await;

  let (status, body) = send(
    &app,
    json_request(
      "PUT",
      &format!("/observations/{id}"),
      json!({ "unit": "NDVI", "unknown_key": true }),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Updated");

  grant(&app, "alice", 1).await;
  let (_, body) =
    send(&app, get_as(&format!("/observations/{id}"), Some("alice"))).await;
  assert_eq!(body["unit"], "NDVI");
  assert_eq!(body["value"], "0.5");
}

#[tokio::test]
async fn filter_endpoint_matches_on_allow_listed_fields() {
  let app = router().await;
  create_observation(&app, json!({ "product_id": 1, "value": "0.1" })).await;
  create_observation(&app, json!({ "product_id": 2, "value": "0.2" })).await;

  let (status, body) =
    send(&app, get_as("/observations/filter?product_id=2", None)).await;
  assert_eq!(status, StatusCode::OK);

  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["product_id"], 2);
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[tokio::test]
async fn subscription_bodies_must_carry_both_fields() {
  let app = router().await;

  let (status, body) = send(
    &app,
    json_request("POST", "/subscriptions", json!({ "user_id": "alice" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Missing user_id or product_id");
}

#[tokio::test]
async fn revoke_roundtrip_and_not_found() {
  let app = router().await;
  grant(&app, "alice", 1).await;

  let body = json!({ "user_id": "alice", "product_id": 1 });
  let (status, response) =
    send(&app, json_request("DELETE", "/subscriptions", body.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(response["message"], "Subscription cancelled");

  let (status, _) =
    send(&app, json_request("DELETE", "/subscriptions", body)).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscriptions_list_filters_by_user() {
  let app = router().await;
  grant(&app, "alice", 1).await;
  grant(&app, "bob", 2).await;

  let (status, body) =
    send(&app, get_as("/subscriptions?user_id=alice", None)).await;
  assert_eq!(status, StatusCode::OK);

  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["user_id"], "alice");
  assert_eq!(rows[0]["product_id"], 1);
}

// ─── Bulk retrieval ──────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_insights_reports_found_and_failed() {
  let app = router().await;
  let id =
    create_observation(&app, json!({ "product_id": 1, "value": "0.5" })).await;

  let (status, body) =
    send(&app, get_as(&format!("/v1/bulk/insights?ids={id},999"), None)).await;
  assert_eq!(status, StatusCode::OK);

  assert_eq!(body["results"].as_array().unwrap().len(), 1);
  assert_eq!(body["metadata"]["total_requested"], 2);
  assert_eq!(body["metadata"]["found"], 1);
  assert_eq!(body["metadata"]["failed_count"], 1);
  assert_eq!(body["metadata"]["failures"][0]["id"], 999);
}

#[tokio::test]
async fn bulk_insights_rejects_missing_or_bad_ids() {
  let app = router().await;

  let (status, _) = send(&app, get_as("/v1/bulk/insights", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) =
    send(&app, get_as("/v1/bulk/insights?ids=1,abc", None)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "IDs must be numeric.");
}

// ─── Usage ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn usage_stats_reflect_logged_calls() {
  let app = router().await;
  grant(&app, "alice", 1).await;
  create_observation(&app, json!({ "product_id": 1, "value": "0.5" })).await;
  let (_, _) = send(&app, get_as("/observations", Some("alice"))).await;

  let (status, body) = send(&app, get_as("/usage-stats", None)).await;
  assert_eq!(status, StatusCode::OK);

  // One POST and one GET were logged above.
  assert_eq!(body["total_calls_last_hour"], 2);
  assert_eq!(
    body["labels"].as_array().unwrap().len(),
    body["data"].as_array().unwrap().len()
  );
}

#[tokio::test]
async fn simulate_traffic_seeds_usage_and_one_observation() {
  let app = router().await;

  let req = Request::builder()
    .method("POST")
    .uri("/simulate-traffic")
    .body(Body::empty())
    .unwrap();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["count"], 5);

  let (status, body) = send(&app, get_as("/usage-stats", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["total_calls_last_hour"], 5);

  let (_, body) = send(&app, get_as("/observations/filter", None)).await;
  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0]["notes"], "Simulated Data");
  assert_eq!(rows[0]["unit"], "Index");
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_probe() {
  let app = router().await;
  let (status, body) = send(&app, get_as("/health", None)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}
