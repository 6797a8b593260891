//! The `GeoStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `geoscope-store-sqlite`). Higher layers (`geoscope-api`,
//! `geoscope-server`) depend on this abstraction, not on any concrete
//! backend.

use std::collections::BTreeSet;
use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  observation::{NewObservation, ObservationPatch, ObservationRecord},
  product::Product,
  subscription::Subscription,
  usage::{ApiUsage, UsageBucket},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`GeoStore::list_observations`]. Predicates are ANDed; the
/// default query matches every record.
#[derive(Debug, Clone, Default)]
pub struct ObservationQuery {
  /// Restrict to these record ids (bulk fetch).
  pub ids:          Option<Vec<i64>>,
  /// Restrict to records owned by one of these products (the entitlement
  /// subset computed by the policy evaluator).
  pub product_ids:  Option<BTreeSet<i64>>,
  /// Exclude unowned records. The bulk listing path always sets this:
  /// unowned records are reachable by direct id fetch only.
  pub owned_only:   bool,
  /// Equality filters on pass-through metadata fields.
  pub satellite_id: Option<String>,
  pub unit:         Option<String>,
  pub timezone:     Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a GeoScope storage backend.
///
/// Grants and observation writes are independent, commutative operations
/// with no cross-record invariants, so every method is a single storage
/// call — no multi-step transactions. Missing rows are reported as
/// `None`/`false`; the query service maps them onto its error taxonomy.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GeoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Products ──────────────────────────────────────────────────────────

  /// Insert or replace a catalog entry. Products are immutable reference
  /// data; this exists for seeding and tests.
  fn upsert_product(
    &self,
    product: Product,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a catalog entry. Returns `None` if not found.
  fn get_product(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  /// The full catalog, in id order.
  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  /// Batch-resolve catalog entries; ids that resolve to nothing are simply
  /// absent from the result. Used by the query service to attach display
  /// names without per-row lookups.
  fn get_products_by_ids<'a>(
    &'a self,
    ids: &'a [i64],
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + 'a;

  // ── Subscriptions (entitlement store) ─────────────────────────────────

  /// Record a grant. Always succeeds; duplicates are harmless.
  fn add_subscription<'a>(
    &'a self,
    user_id: &'a str,
    product_id: i64,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + 'a;

  /// Remove exactly one grant matching both fields. Returns `false` when no
  /// grant matches.
  fn remove_subscription<'a>(
    &'a self,
    user_id: &'a str,
    product_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Administrative listing, optionally restricted to one user.
  fn list_subscriptions<'a>(
    &'a self,
    user_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + 'a;

  /// The products `user_id` is directly entitled to — not expanded for the
  /// universal rule; expansion is [`crate::policy::Entitlements`]' job.
  fn subscribed_product_ids<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + 'a;

  // ── Observations ──────────────────────────────────────────────────────

  /// Assign an id, default the timestamp to now, store the record.
  fn insert_observation(
    &self,
    input: NewObservation,
  ) -> impl Future<Output = Result<ObservationRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_observation(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ObservationRecord>, Self::Error>> + Send + '_;

  /// Unordered listing. Ordering is a presentation-level concern applied by
  /// the query service, not a repository invariant.
  fn list_observations<'a>(
    &'a self,
    query: &'a ObservationQuery,
  ) -> impl Future<Output = Result<Vec<ObservationRecord>, Self::Error>> + Send + 'a;

  /// Apply `patch` to the stored record and return the updated row, or
  /// `None` when the id does not exist (store state unchanged).
  fn update_observation(
    &self,
    id: i64,
    patch: ObservationPatch,
  ) -> impl Future<Output = Result<Option<ObservationRecord>, Self::Error>> + Send + '_;

  /// Returns `false` when the id does not exist.
  fn delete_observation(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Usage log ─────────────────────────────────────────────────────────

  /// Append one usage entry. Best-effort at the call sites: the transport
  /// layer logs and swallows failures.
  fn log_usage<'a>(
    &'a self,
    endpoint: &'a str,
  ) -> impl Future<Output = Result<ApiUsage, Self::Error>> + Send + 'a;

  /// Per-minute call counts since `since`, ascending by bucket label.
  fn usage_stats(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<UsageBucket>, Self::Error>> + Send + '_;
}
