//! Encoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns, plus raw row structs.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (millisecond
//! precision, `Z` suffix) so that lexical comparison and sqlite's
//! `strftime` both agree with chronological order.

use chrono::{DateTime, SecondsFormat, Timelike as _, Utc};
use geoscope_core::{observation::ObservationRecord, subscription::Subscription};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Truncate to the millisecond precision that survives a storage round
/// trip, so returned records equal their later re-reads.
pub fn normalize_dt(dt: DateTime<Utc>) -> DateTime<Utc> {
  dt.with_nanosecond(dt.nanosecond() / 1_000_000 * 1_000_000)
    .unwrap_or(dt)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `observations` row.
pub struct RawObservation {
  pub id:               i64,
  pub timestamp:        String,
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

impl RawObservation {
  pub fn into_record(self) -> Result<ObservationRecord> {
    Ok(ObservationRecord {
      id:               self.id,
      timestamp:        decode_dt(&self.timestamp)?,
      timezone:         self.timezone,
      coordinates:      self.coordinates,
      satellite_id:     self.satellite_id,
      spectral_indices: self.spectral_indices,
      notes:            self.notes,
      product_id:       self.product_id,
      value:            self.value,
      unit:             self.unit,
      confidence:       self.confidence,
    })
  }
}

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub id:         i64,
  pub user_id:    String,
  pub product_id: i64,
  pub created_at: String,
}

impl RawSubscription {
  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      id:         self.id,
      user_id:    self.user_id,
      product_id: self.product_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
