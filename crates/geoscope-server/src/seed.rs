//! Default product catalog, seeded when the products table is empty.

use geoscope_core::{
  product::{Product, UNIVERSAL_PRODUCT_ID},
  store::GeoStore,
};

/// The launch catalog. Product 5 is the all-access plan backing the
/// universal-visibility rule.
pub fn default_catalog() -> Vec<Product> {
  let entry = |id: i64, name: &str, description: &str, price: &str| Product {
    id,
    name:        name.to_string(),
    description: Some(description.to_string()),
    price:       Some(price.to_string()),
  };

  vec![
    entry(
      1,
      "Crop Health Monitoring",
      "NDVI-based crop vigour analysis",
      "$499/mo",
    ),
    entry(
      2,
      "Wildfire Risk Assessment",
      "Fuel-moisture and burn-risk indices",
      "$399/mo",
    ),
    entry(
      3,
      "Urban Expansion Tracking",
      "Built-up area change detection",
      "$299/mo",
    ),
    entry(
      4,
      "Deforestation Alert System",
      "Canopy-loss alerting",
      "$199/mo",
    ),
    entry(
      UNIVERSAL_PRODUCT_ID,
      "Pro Plan (All Access)",
      "Full access to every data product",
      "$999/mo",
    ),
  ]
}

/// Insert the default catalog if no products exist yet.
pub async fn ensure_catalog<S: GeoStore>(store: &S) -> Result<(), S::Error> {
  if !store.list_products().await?.is_empty() {
    return Ok(());
  }

  for product in default_catalog() {
    store.upsert_product(product).await?;
  }
  tracing::info!("seeded default product catalog");
  Ok(())
}
