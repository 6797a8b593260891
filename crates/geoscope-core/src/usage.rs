//! Append-only API usage log entries and their aggregation buckets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One logged API call. Write-only from the core's perspective; read back
/// only through [`crate::store::GeoStore::usage_stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUsage {
  pub id:        i64,
  pub timestamp: DateTime<Utc>,
  pub endpoint:  String,
}

/// A per-minute aggregation bucket: `HH:MM` label plus call count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageBucket {
  pub bucket: String,
  pub count:  i64,
}
