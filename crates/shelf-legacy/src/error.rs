//! Error types for the shelf-legacy codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("field `{field}` contains a reserved delimiter (`;` or `|`)")]
  ReservedDelimiter { field: &'static str },

  /// The borrower identity `0` cannot be told apart from "no borrower".
  #[error("field `{field}` collides with the empty sentinel `0`")]
  SentinelCollision { field: &'static str },

  #[error("expected {expected} fields, found {found}")]
  FieldCount { expected: usize, found: usize },

  #[error("invalid integer in {field}: {value:?}")]
  InvalidInteger { field: &'static str, value: String },

  #[error("invalid state code: {0:?}")]
  InvalidState(String),

  #[error("invalid identity in {field}: {source}")]
  InvalidIdentity { field: &'static str, source: shelf_core::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
