//! Caller-identity extractor.
//!
//! Deployments front this service with a gateway that verifies the JWT; by
//! the time a request reaches these handlers the bearer payload is the
//! already-verified, opaque user identifier. This extractor only peels it
//! out of the `Authorization` header.

use axum::{
  extract::FromRequestParts,
  http::{header, request::Parts},
};

use crate::error::ApiError;

/// The opaque user identity asserted by the transport boundary. Present in
/// a handler's signature means the request carried one.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

impl<St> FromRequestParts<St> for CallerIdentity
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &St,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthorized)?
      .trim();

    if token.is_empty() {
      return Err(ApiError::Unauthorized);
    }

    Ok(CallerIdentity(token.to_owned()))
  }
}
