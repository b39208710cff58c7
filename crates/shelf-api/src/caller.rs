//! The [`Caller`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use shelf_core::identity::Identity;

use crate::error::ApiError;

/// Request header naming the identity a request acts on behalf of.
///
/// The API trusts this header as given; authenticating it belongs to
/// whatever sits in front of the API.
pub const CALLER_HEADER: &str = "x-shelf-caller";

/// The identity a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(CALLER_HEADER)
      .ok_or(ApiError::MissingCaller)?
      .to_str()
      .map_err(|e| ApiError::InvalidCaller(e.to_string()))?;

    Identity::parse(raw)
      .map(Caller)
      .map_err(|e| ApiError::InvalidCaller(e.to_string()))
  }
}
