//! Product — the subscription-gated reference data observations belong to.

use serde::{Deserialize, Serialize};

/// The sentinel product id whose subscription grants visibility into every
/// other product's observations (the "all access" plan). Hard-coded by
/// design: there is exactly one such plan and it is not a flag on the
/// product row.
pub const UNIVERSAL_PRODUCT_ID: i64 = 5;

/// Immutable catalog entry describing a sellable data product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
  /// Display price, e.g. `"$499/mo"`. Billing itself lives elsewhere.
  pub price:       Option<String>,
}

impl Product {
  /// Display-name fallback for a product id that resolves to nothing.
  pub fn fallback_name(id: i64) -> String { format!("Product #{id}") }
}
