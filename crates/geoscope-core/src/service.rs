//! The observation query service — composes the repository with the access
//! policy evaluator.
//!
//! The store is injected explicitly and threaded through every operation;
//! nothing here reaches for ambient state. Product display names are
//! batch-resolved once per request before serialisation.

use std::{
  collections::{BTreeSet, HashMap},
  sync::Arc,
};

use crate::{
  Error, Result,
  observation::{NewObservation, ObservationPatch, ObservationRecord, ObservationView},
  policy::{Entitlements, ProductVisibility},
  product::Product,
  store::{GeoStore, ObservationQuery},
};

// ─── Service ─────────────────────────────────────────────────────────────────

/// Authorized reads and unrestricted writes over observation records.
///
/// Reads are gated by the entitlement policy; writes intentionally are not
/// (see DESIGN.md). Construction is cheap — the store handle is
/// reference-counted.
pub struct ObservationService<S> {
  store: Arc<S>,
}

impl<S> Clone for ObservationService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: GeoStore> ObservationService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Snapshot the caller's direct grants into a policy evaluator. One store
  /// round trip per request.
  async fn entitlements(&self, user_id: &str) -> Result<Entitlements> {
    let ids = self
      .store
      .subscribed_product_ids(user_id)
      .await
      .map_err(Error::store)?;
    Ok(Entitlements::new(ids))
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Create a record and return its assigned id.
  ///
  /// Creation carries no entitlement check; only structural validation is
  /// applied.
  pub async fn create(&self, input: NewObservation) -> Result<i64> {
    if input.value.as_deref().is_none_or(|v| v.trim().is_empty()) {
      return Err(Error::Validation("value is required".into()));
    }
    if let Some(id) = input.product_id
      && id < 1
    {
      return Err(Error::Validation(format!("invalid product_id: {id}")));
    }

    let record = self
      .store
      .insert_observation(input)
      .await
      .map_err(Error::store)?;
    Ok(record.id)
  }

  /// Allow-listed partial update; `NotFound` when the id does not exist.
  /// No entitlement check on writes.
  pub async fn update(&self, id: i64, patch: ObservationPatch) -> Result<()> {
    self
      .store
      .update_observation(id, patch)
      .await
      .map_err(Error::store)?
      .map(|_| ())
      .ok_or(Error::NotFound(id))
  }

  /// Delete by id; `NotFound` when absent. No entitlement check.
  pub async fn delete(&self, id: i64) -> Result<()> {
    let removed = self
      .store
      .delete_observation(id)
      .await
      .map_err(Error::store)?;
    if removed { Ok(()) } else { Err(Error::NotFound(id)) }
  }

  // ── Authorized reads ──────────────────────────────────────────────────

  /// The caller-visible subset of owned observations, newest first.
  ///
  /// A caller with no grants gets an empty Vec, never an error
  /// (deny-by-omission). Unowned records never appear here — they are
  /// reachable by direct id fetch only.
  pub async fn list_visible(&self, user_id: &str) -> Result<Vec<ObservationView>> {
    let ent = self.entitlements(user_id).await?;

    let query = match ent.visibility() {
      ProductVisibility::None => return Ok(Vec::new()),
      ProductVisibility::All => {
        ObservationQuery { owned_only: true, ..Default::default() }
      }
      ProductVisibility::Products(set) => ObservationQuery {
        owned_only:  true,
        product_ids: Some(set),
        ..Default::default()
      },
    };

    let mut records = self
      .store
      .list_observations(&query)
      .await
      .map_err(Error::store)?;
    records.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));

    self.into_views(records).await
  }

  /// Fetch one record with the access check applied: `NotFound` when
  /// absent, `Forbidden` (deny-by-error, unlike the listing path) when the
  /// caller holds neither the owning grant nor the universal one.
  pub async fn get_visible(&self, user_id: &str, id: i64) -> Result<ObservationView> {
    let record = self
      .store
      .get_observation(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(id))?;

    if record.product_id.is_some() {
      let ent = self.entitlements(user_id).await?;
      if !ent.can_view(record.product_id) {
        return Err(Error::Forbidden);
      }
    }

    let name = self.resolve_name(record.product_id).await?;
    Ok(ObservationView::from_record(record, name))
  }

  // ── Unauthorized reads ────────────────────────────────────────────────

  /// Bulk fetch by explicit id list: found views plus the ids that matched
  /// nothing. Carries no entitlement check, like the rest of the bulk
  /// surface.
  pub async fn fetch_many(
    &self,
    ids: &[i64],
  ) -> Result<(Vec<ObservationView>, Vec<i64>)> {
    let query = ObservationQuery { ids: Some(ids.to_vec()), ..Default::default() };
    let records = self
      .store
      .list_observations(&query)
      .await
      .map_err(Error::store)?;

    let found: BTreeSet<i64> = records.iter().map(|r| r.id).collect();
    let missing = ids.iter().copied().filter(|id| !found.contains(id)).collect();

    Ok((self.into_views(records).await?, missing))
  }

  /// Allow-listed equality filtering over all records, shaped for the wire.
  pub async fn filter(&self, query: &ObservationQuery) -> Result<Vec<ObservationView>> {
    let records = self
      .store
      .list_observations(query)
      .await
      .map_err(Error::store)?;
    self.into_views(records).await
  }

  // ── Serialisation shaping ─────────────────────────────────────────────

  /// Resolve the display name for a single owning product.
  async fn resolve_name(&self, product_id: Option<i64>) -> Result<Option<String>> {
    let Some(pid) = product_id else { return Ok(None) };
    let products = self
      .store
      .get_products_by_ids(&[pid])
      .await
      .map_err(Error::store)?;
    Ok(Some(
      products
        .into_iter()
        .next()
        .map(|p| p.name)
        .unwrap_or_else(|| Product::fallback_name(pid)),
    ))
  }

  /// Batch-resolve product names and shape records for the wire — one
  /// catalog lookup per request regardless of row count.
  async fn into_views(
    &self,
    records: Vec<ObservationRecord>,
  ) -> Result<Vec<ObservationView>> {
    let ids: Vec<i64> = records
      .iter()
      .filter_map(|r| r.product_id)
      .collect::<BTreeSet<_>>()
      .into_iter()
      .collect();

    let names: HashMap<i64, String> = if ids.is_empty() {
      HashMap::new()
    } else {
      self
        .store
        .get_products_by_ids(&ids)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect()
    };

    Ok(
      records
        .into_iter()
        .map(|record| {
          let name = record.product_id.map(|pid| {
            names
              .get(&pid)
              .cloned()
              .unwrap_or_else(|| Product::fallback_name(pid))
          });
          ObservationView::from_record(record, name)
        })
        .collect(),
    )
  }
}
