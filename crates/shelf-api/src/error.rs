//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use shelf_core::error::AsDomainError;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing x-shelf-caller header")]
  MissingCaller,

  #[error("invalid x-shelf-caller header: {0}")]
  InvalidCaller(String),

  /// A registry rule rejected the request.
  #[error(transparent)]
  Domain(shelf_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("cannot encode as legacy records: {0}")]
  Legacy(#[from] shelf_legacy::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Split a backend error into a rule rejection or an internal failure.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + AsDomainError + Send + Sync + 'static,
  {
    match e.as_domain() {
      Some(domain) => ApiError::Domain(domain.clone()),
      None => ApiError::Store(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    use shelf_core::Error as E;

    match self {
      ApiError::MissingCaller | ApiError::InvalidCaller(_) => StatusCode::UNAUTHORIZED,
      ApiError::Domain(e) => match e {
        E::Unauthorized { .. } => StatusCode::FORBIDDEN,
        E::NotFound(_) => StatusCode::NOT_FOUND,
        E::AlreadyBorrowed(_)
        | E::NotBorrowed(_)
        | E::AlreadyInitialized
        | E::NotInitialized => StatusCode::CONFLICT,
        E::InsufficientValue { .. } | E::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
        E::InvalidIdentity(_) | E::InvalidRating(_) => StatusCode::BAD_REQUEST,
        E::BalanceOverflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
      },
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Legacy(_) => StatusCode::NOT_ACCEPTABLE,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<shelf_core::Error> for ApiError {
  fn from(e: shelf_core::Error) -> Self { ApiError::Domain(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error.cause_chain = ?self, error.message = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
