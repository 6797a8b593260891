//! SQL schema for the GeoScope SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Immutable catalog reference data; rows are seeded, never edited in place.
CREATE TABLE IF NOT EXISTS products (
    product_id  INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    price       TEXT             -- display string, e.g. '$499/mo'
);

-- Entitlement grants. Duplicates for the same (user, product) pair are
-- legal; revocation removes one row at a time.
CREATE TABLE IF NOT EXISTS subscriptions (
    subscription_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT    NOT NULL,
    product_id      INTEGER NOT NULL,
    created_at      TEXT    NOT NULL
);

-- AUTOINCREMENT keeps observation ids monotonically unique even across
-- deletes.
CREATE TABLE IF NOT EXISTS observations (
    observation_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp        TEXT NOT NULL,   -- RFC 3339 UTC, millisecond precision
    timezone         TEXT,
    coordinates      TEXT,
    satellite_id     TEXT,
    spectral_indices TEXT,
    notes            TEXT,
    product_id       INTEGER,         -- NULL = unowned, visible to everyone
    value            TEXT,            -- decimal string, e.g. '0.85'
    unit             TEXT,            -- e.g. 'NDVI'
    confidence       REAL
);

-- Strictly append-only usage log.
CREATE TABLE IF NOT EXISTS api_usage (
    usage_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    endpoint  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS subscriptions_user_idx    ON subscriptions(user_id);
CREATE INDEX IF NOT EXISTS observations_product_idx  ON observations(product_id);
CREATE INDEX IF NOT EXISTS observations_time_idx     ON observations(timestamp);
CREATE INDEX IF NOT EXISTS api_usage_time_idx        ON api_usage(timestamp);

PRAGMA user_version = 1;
";
