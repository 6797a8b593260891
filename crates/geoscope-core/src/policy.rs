//! The fixed entitlement rule set gating observation reads.
//!
//! One rule, one constant: a caller may view a product's observations iff
//! they hold a direct grant to that product or a grant to
//! [`UNIVERSAL_PRODUCT_ID`]. Unowned observations (null product id) pass the
//! per-record check for everyone.
//!
//! The per-record check and the bulk visibility descriptor are deliberately
//! separate operations: list endpoints compute the descriptor once per
//! request instead of consulting entitlements per row.

use std::collections::BTreeSet;

use crate::product::UNIVERSAL_PRODUCT_ID;

// ─── Visibility descriptor ───────────────────────────────────────────────────

/// Bulk-listing predicate, computed once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductVisibility {
  /// The caller holds the universal grant: every owned record is visible.
  All,
  /// The caller holds no grants. The listing must render as an empty
  /// result, not an error.
  None,
  /// The caller sees exactly the observations owned by these products.
  Products(BTreeSet<i64>),
}

// ─── Entitlements ────────────────────────────────────────────────────────────

/// A per-request snapshot of a caller's direct grants.
///
/// Built from [`crate::store::GeoStore::subscribed_product_ids`]. Universal
/// expansion happens here, never in the entitlement store itself.
#[derive(Debug, Clone, Default)]
pub struct Entitlements {
  products: BTreeSet<i64>,
}

impl Entitlements {
  pub fn new(product_ids: impl IntoIterator<Item = i64>) -> Self {
    Self { products: product_ids.into_iter().collect() }
  }

  pub fn is_empty(&self) -> bool { self.products.is_empty() }

  pub fn holds_universal(&self) -> bool {
    self.products.contains(&UNIVERSAL_PRODUCT_ID)
  }

  /// Per-record check: may the caller view a record owned by `product_id`?
  /// Unowned records (`None`) are viewable by everyone.
  pub fn can_view(&self, product_id: Option<i64>) -> bool {
    match product_id {
      None => true,
      Some(id) => self.products.contains(&id) || self.holds_universal(),
    }
  }

  /// The bulk-listing descriptor. See [`ProductVisibility`].
  pub fn visibility(&self) -> ProductVisibility {
    if self.products.is_empty() {
      ProductVisibility::None
    } else if self.holds_universal() {
      ProductVisibility::All
    } else {
      ProductVisibility::Products(self.products.clone())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_grants_yields_empty_visibility_not_an_error() {
    let ent = Entitlements::default();
    assert_eq!(ent.visibility(), ProductVisibility::None);
    assert!(!ent.can_view(Some(1)));
  }

  #[test]
  fn unowned_records_pass_the_per_record_check_for_everyone() {
    assert!(Entitlements::default().can_view(None));
    assert!(Entitlements::new([2]).can_view(None));
    assert!(Entitlements::new([UNIVERSAL_PRODUCT_ID]).can_view(None));
  }

  #[test]
  fn universal_grant_sees_everything() {
    let ent = Entitlements::new([UNIVERSAL_PRODUCT_ID]);
    assert_eq!(ent.visibility(), ProductVisibility::All);
    assert!(ent.can_view(Some(1)));
    assert!(ent.can_view(Some(999)));
  }

  #[test]
  fn direct_grants_restrict_to_the_subset() {
    let ent = Entitlements::new([1, 3]);
    assert_eq!(
      ent.visibility(),
      ProductVisibility::Products(BTreeSet::from([1, 3]))
    );
    assert!(ent.can_view(Some(1)));
    assert!(ent.can_view(Some(3)));
    assert!(!ent.can_view(Some(2)));
  }

  #[test]
  fn duplicate_grants_collapse_in_the_snapshot() {
    let ent = Entitlements::new([2, 2, 2]);
    assert_eq!(ent.visibility(), ProductVisibility::Products(BTreeSet::from([2])));
  }
}
