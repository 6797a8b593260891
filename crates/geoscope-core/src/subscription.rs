//! Subscription — a (user, product) entitlement grant.
//!
//! Existence means active: there is no expiry and no quantity. Duplicate
//! grants for the same pair are permitted and harmless.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A grant authorizing `user_id` to read observations owned by `product_id`.
/// The user identifier is opaque to this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
  pub id:         i64,
  pub user_id:    String,
  pub product_id: i64,
  pub created_at: DateTime<Utc>,
}
