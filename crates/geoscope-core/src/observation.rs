//! Observation record types — the unit of data gated by subscriptions.
//!
//! Geo/sensor metadata (coordinates, satellite id, timezone, spectral
//! indices) is pass-through: stored exactly as given, with no validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ─── Record ──────────────────────────────────────────────────────────────────

/// A stored environmental observation. `product_id` names the owning
/// product; records with no owner pass the per-record access check for
/// everyone but never appear in bulk listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
  pub id:               i64,
  /// Creation time (UTC); server-assigned when absent from the input.
  pub timestamp:        DateTime<Utc>,
  pub timezone:         Option<String>,
  pub coordinates:      Option<String>,
  pub satellite_id:     Option<String>,
  pub spectral_indices: Option<String>,
  pub notes:            Option<String>,
  pub product_id:       Option<i64>,
  /// Decimal string, e.g. `"0.85"` — kept textual to avoid float rounding
  /// in transit.
  pub value:            Option<String>,
  pub unit:             Option<String>,
  pub confidence:       Option<f64>,
}

// ─── NewObservation ──────────────────────────────────────────────────────────

/// Input to [`crate::store::GeoStore::insert_observation`]. The id is always
/// assigned by the store; `timestamp` defaults to now when `None`.
#[derive(Debug, Clone, Default)]
pub struct NewObservation {
  pub timestamp:        Option<DateTime<Utc>>,
  pub timezone:         Option<String>,
  pub coordinates:      Option<String>,
  pub satellite_id:     Option<String>,
  pub spectral_indices: Option<String>,
  pub notes:            Option<String>,
  pub product_id:       Option<i64>,
  pub value:            Option<String>,
  pub unit:             Option<String>,
  pub confidence:       Option<f64>,
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// Allow-listed partial update. Unknown JSON keys are silently ignored and
/// absent fields are left unchanged. `product_id` alone distinguishes an
/// explicit `null` (clear ownership) from absence, since moving a record to
/// unowned changes who may see it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationPatch {
  pub timestamp:        Option<DateTime<Utc>>,
  pub timezone:         Option<String>,
  pub coordinates:      Option<String>,
  pub satellite_id:     Option<String>,
  pub spectral_indices: Option<String>,
  pub notes:            Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub product_id:       Option<Option<i64>>,
  pub value:            Option<String>,
  pub unit:             Option<String>,
  pub confidence:       Option<f64>,
}

/// Wraps a present-but-possibly-null field so `None` means "absent" and
/// `Some(None)` means "explicit null".
fn double_option<'de, D>(de: D) -> Result<Option<Option<i64>>, D::Error>
where
  D: Deserializer<'de>,
{
  Option::<i64>::deserialize(de).map(Some)
}

impl ObservationPatch {
  /// Apply every present field to `record`, leaving the rest untouched.
  pub fn apply_to(&self, record: &mut ObservationRecord) {
    if let Some(timestamp) = self.timestamp {
      record.timestamp = timestamp;
    }
    if let Some(timezone) = &self.timezone {
      record.timezone = Some(timezone.clone());
    }
    if let Some(coordinates) = &self.coordinates {
      record.coordinates = Some(coordinates.clone());
    }
    if let Some(satellite_id) = &self.satellite_id {
      record.satellite_id = Some(satellite_id.clone());
    }
    if let Some(spectral_indices) = &self.spectral_indices {
      record.spectral_indices = Some(spectral_indices.clone());
    }
    if let Some(notes) = &self.notes {
      record.notes = Some(notes.clone());
    }
    if let Some(product_id) = self.product_id {
      record.product_id = product_id;
    }
    if let Some(value) = &self.value {
      record.value = Some(value.clone());
    }
    if let Some(unit) = &self.unit {
      record.unit = Some(unit.clone());
    }
    if let Some(confidence) = self.confidence {
      record.confidence = Some(confidence);
    }
  }
}

// ─── View ────────────────────────────────────────────────────────────────────

/// The serialisation shape returned by the query service. Field names and
/// order are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationView {
  pub id:               i64,
  pub timestamp:        DateTime<Utc>,
  pub timezone:         Option<String>,
  pub coordinates:      Option<String>,
  pub satellite_id:     Option<String>,
  pub spectral_indices: Option<String>,
  pub notes:            Option<String>,
  pub product_id:       Option<i64>,
  /// Resolved display name: `"Product #N"` when the owning id resolves to
  /// nothing, `null` for unowned records.
  pub product_name:     Option<String>,
  pub value:            Option<String>,
  pub unit:             Option<String>,
  pub confidence:       Option<f64>,
}

impl ObservationView {
  /// Shape a record for the wire, attaching its resolved product name.
  pub fn from_record(
    record: ObservationRecord,
    product_name: Option<String>,
  ) -> Self {
    Self {
      id:               record.id,
      timestamp:        record.timestamp,
      timezone:         record.timezone,
      coordinates:      record.coordinates,
      satellite_id:     record.satellite_id,
      spectral_indices: record.spectral_indices,
      notes:            record.notes,
      product_id:       record.product_id,
      product_name,
      value:            record.value,
      unit:             record.unit,
      confidence:       record.confidence,
    }
  }
}
