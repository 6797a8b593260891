//! Error types for `geoscope-core`.

use thiserror::Error;

/// The query-service error taxonomy. Storage backends define their own error
/// types; they are boxed when they cross the service boundary.
#[derive(Debug, Error)]
pub enum Error {
  /// Malformed or missing required input.
  #[error("validation error: {0}")]
  Validation(String),

  /// The requested observation id does not exist.
  #[error("observation not found: {0}")]
  NotFound(i64),

  /// The caller is authenticated but holds no qualifying subscription.
  /// Raised only on the single-record fetch path; bulk listing renders the
  /// same situation as an empty result.
  #[error("forbidden: subscription required")]
  Forbidden,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into the service taxonomy.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
