//! [`SqliteStore`] — the SQLite implementation of [`GeoStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use geoscope_core::{
  observation::{NewObservation, ObservationPatch, ObservationRecord},
  product::Product,
  store::{GeoStore, ObservationQuery},
  subscription::Subscription,
  usage::{ApiUsage, UsageBucket},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawObservation, RawSubscription, encode_dt, normalize_dt},
  schema::SCHEMA,
};

const OBSERVATION_COLUMNS: &str = "observation_id, timestamp, timezone, \
   coordinates, satellite_id, spectral_indices, notes, product_id, value, \
   unit, confidence";

const PRODUCT_COLUMNS: &str = "product_id, name, description, price";

const SUBSCRIPTION_COLUMNS: &str =
  "subscription_id, user_id, product_id, created_at";

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn observation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawObservation> {
  Ok(RawObservation {
    id:               row.get(0)?,
    timestamp:        row.get(1)?,
    timezone:         row.get(2)?,
    coordinates:      row.get(3)?,
    satellite_id:     row.get(4)?,
    spectral_indices: row.get(5)?,
    notes:            row.get(6)?,
    product_id:       row.get(7)?,
    value:            row.get(8)?,
    unit:             row.get(9)?,
    confidence:       row.get(10)?,
  })
}

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
  Ok(Product {
    id:          row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
    price:       row.get(3)?,
  })
}

fn subscription_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubscription> {
  Ok(RawSubscription {
    id:         row.get(0)?,
    user_id:    row.get(1)?,
    product_id: row.get(2)?,
    created_at: row.get(3)?,
  })
}

/// `column IN (?n, ?n+1, …)` with placeholders numbered after `offset`, or a
/// contradiction for an empty id list (SQL `IN ()` is a syntax error).
fn in_clause(column: &str, len: usize, offset: usize) -> String {
  if len == 0 {
    return "1 = 0".to_string();
  }
  let placeholders: Vec<String> =
    (1..=len).map(|i| format!("?{}", offset + i)).collect();
  format!("{column} IN ({})", placeholders.join(", "))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A GeoScope store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every trait
/// method is a single serialized connection call, which is all the isolation
/// this data model needs: grants and record writes are independent,
/// commutative operations.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── GeoStore impl ───────────────────────────────────────────────────────────

impl GeoStore for SqliteStore {
  type Error = Error;

  // ── Products ──────────────────────────────────────────────────────────────

  async fn upsert_product(&self, product: Product) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO products (product_id, name, description, price)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            product.id,
            product.name,
            product.description,
            product.price,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_product(&self, id: i64) -> Result<Option<Product>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!(
                  "SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1"
                ),
                rusqlite::params![id],
                product_from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn list_products(&self) -> Result<Vec<Product>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY product_id"
          ))?;
          let rows = stmt
            .query_map([], product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn get_products_by_ids(&self, ids: &[i64]) -> Result<Vec<Product>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let ids = ids.to_vec();

    Ok(
      self
        .conn
        .call(move |conn| {
          let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE {}",
            in_clause("product_id", ids.len(), 0)
          );
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params_from_iter(ids), product_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  // ── Subscriptions (entitlement store) ─────────────────────────────────────

  async fn add_subscription(
    &self,
    user_id: &str,
    product_id: i64,
  ) -> Result<Subscription> {
    let created_at = normalize_dt(Utc::now());
    let at_str     = encode_dt(created_at);
    let user       = user_id.to_owned();
    let row_user   = user.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (user_id, product_id, created_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user, product_id, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Subscription { id, user_id: row_user, product_id, created_at })
  }

  async fn remove_subscription(
    &self,
    user_id: &str,
    product_id: i64,
  ) -> Result<bool> {
    let user = user_id.to_owned();

    let removed: usize = self
      .conn
      .call(move |conn| {
        // Duplicate grants are legal; a revoke removes exactly one of them.
        Ok(conn.execute(
          "DELETE FROM subscriptions WHERE subscription_id =
             (SELECT subscription_id FROM subscriptions
              WHERE user_id = ?1 AND product_id = ?2 LIMIT 1)",
          rusqlite::params![user, product_id],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  async fn list_subscriptions(
    &self,
    user_id: Option<&str>,
  ) -> Result<Vec<Subscription>> {
    let user = user_id.map(str::to_owned);

    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(u) = user {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![u], subscription_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions"
          ))?;
          stmt
            .query_map([], subscription_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }

  async fn subscribed_product_ids(&self, user_id: &str) -> Result<Vec<i64>> {
    let user = user_id.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn
            .prepare("SELECT product_id FROM subscriptions WHERE user_id = ?1")?;
          let rows = stmt
            .query_map(rusqlite::params![user], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  // ── Observations ──────────────────────────────────────────────────────────

  async fn insert_observation(
    &self,
    input: NewObservation,
  ) -> Result<ObservationRecord> {
    let timestamp = normalize_dt(input.timestamp.unwrap_or_else(Utc::now));
    let ts_str    = encode_dt(timestamp);
    let fields    = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO observations (
             timestamp, timezone, coordinates, satellite_id, spectral_indices,
             notes, product_id, value, unit, confidence
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            ts_str,
            fields.timezone,
            fields.coordinates,
            fields.satellite_id,
            fields.spectral_indices,
            fields.notes,
            fields.product_id,
            fields.value,
            fields.unit,
            fields.confidence,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ObservationRecord {
      id,
      timestamp,
      timezone:         input.timezone,
      coordinates:      input.coordinates,
      satellite_id:     input.satellite_id,
      spectral_indices: input.spectral_indices,
      notes:            input.notes,
      product_id:       input.product_id,
      value:            input.value,
      unit:             input.unit,
      confidence:       input.confidence,
    })
  }

  async fn get_observation(&self, id: i64) -> Result<Option<ObservationRecord>> {
    let raw: Option<RawObservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {OBSERVATION_COLUMNS} FROM observations
                 WHERE observation_id = ?1"
              ),
              rusqlite::params![id],
              observation_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawObservation::into_record).transpose()
  }

  async fn list_observations(
    &self,
    query: &ObservationQuery,
  ) -> Result<Vec<ObservationRecord>> {
    let q = query.clone();

    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; params are bound positionally.
        let mut conds:  Vec<String> = Vec::new();
        let mut params: Vec<rusqlite::types::Value> = Vec::new();

        if q.owned_only {
          conds.push("product_id IS NOT NULL".to_string());
        }
        if let Some(ids) = &q.ids {
          conds.push(in_clause("observation_id", ids.len(), params.len()));
          params.extend(ids.iter().map(|id| rusqlite::types::Value::Integer(*id)));
        }
        if let Some(product_ids) = &q.product_ids {
          conds.push(in_clause("product_id", product_ids.len(), params.len()));
          params.extend(
            product_ids.iter().map(|id| rusqlite::types::Value::Integer(*id)),
          );
        }
        if let Some(satellite_id) = &q.satellite_id {
          params.push(rusqlite::types::Value::Text(satellite_id.clone()));
          conds.push(format!("satellite_id = ?{}", params.len()));
        }
        if let Some(unit) = &q.unit {
          params.push(rusqlite::types::Value::Text(unit.clone()));
          conds.push(format!("unit = ?{}", params.len()));
        }
        if let Some(timezone) = &q.timezone {
          params.push(rusqlite::types::Value::Text(timezone.clone()));
          conds.push(format!("timezone = ?{}", params.len()));
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql =
          format!("SELECT {OBSERVATION_COLUMNS} FROM observations {where_clause}");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), observation_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservation::into_record).collect()
  }

  async fn update_observation(
    &self,
    id: i64,
    patch: ObservationPatch,
  ) -> Result<Option<ObservationRecord>> {
    // Read-modify-write; two concurrent updates may interleave with
    // last-write-wins semantics, which this data model accepts.
    let existing = match self.get_observation(id).await? {
      Some(record) => record,
      None => return Ok(None),
    };

    let mut updated = existing;
    patch.apply_to(&mut updated);
    updated.timestamp = normalize_dt(updated.timestamp);

    let ts_str = encode_dt(updated.timestamp);
    let row    = updated.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE observations SET
             timestamp = ?1, timezone = ?2, coordinates = ?3,
             satellite_id = ?4, spectral_indices = ?5, notes = ?6,
             product_id = ?7, value = ?8, unit = ?9, confidence = ?10
           WHERE observation_id = ?11",
          rusqlite::params![
            ts_str,
            row.timezone,
            row.coordinates,
            row.satellite_id,
            row.spectral_indices,
            row.notes,
            row.product_id,
            row.value,
            row.unit,
            row.confidence,
            row.id,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(updated))
  }

  async fn delete_observation(&self, id: i64) -> Result<bool> {
    let removed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM observations WHERE observation_id = ?1",
          rusqlite::params![id],
        )?)
      })
      .await?;

    Ok(removed > 0)
  }

  // ── Usage log ─────────────────────────────────────────────────────────────

  async fn log_usage(&self, endpoint: &str) -> Result<ApiUsage> {
    let timestamp    = normalize_dt(Utc::now());
    let at_str       = encode_dt(timestamp);
    let endpoint     = endpoint.to_owned();
    let row_endpoint = endpoint.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO api_usage (timestamp, endpoint) VALUES (?1, ?2)",
          rusqlite::params![at_str, endpoint],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ApiUsage { id, timestamp, endpoint: row_endpoint })
  }

  async fn usage_stats(&self, since: DateTime<Utc>) -> Result<Vec<UsageBucket>> {
    let since_str = encode_dt(since);

    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(
            "SELECT strftime('%H:%M', timestamp) AS bucket, COUNT(usage_id)
             FROM api_usage
             WHERE timestamp >= ?1
             GROUP BY bucket
             ORDER BY bucket",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![since_str], |row| {
              Ok(UsageBucket { bucket: row.get(0)?, count: row.get(1)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }
}
