//! Error type for `shelf-store-sqlite`.

use shelf_core::error::AsDomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The operation was rejected by a registry rule; nothing was written.
  #[error(transparent)]
  Core(#[from] shelf_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

impl AsDomainError for Error {
  fn as_domain(&self) -> Option<&shelf_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      Error::Database(_) => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
