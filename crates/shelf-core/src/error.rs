//! Error types for `shelf-core`.
//!
//! Every variant aborts the operation that raised it with no partial state
//! change. Idempotent no-ops (re-adding a member, removing an unknown one)
//! are not errors and never appear here.

use thiserror::Error;

use crate::{
  book::BookId,
  identity::Identity,
  ledger::{Account, Amount},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{caller} is not allowed to {action}")]
  Unauthorized {
    caller: Identity,
    action: &'static str,
  },

  #[error("book not found: {0}")]
  NotFound(BookId),

  #[error("book {0} is already borrowed")]
  AlreadyBorrowed(BookId),

  #[error("book {0} is not borrowed")]
  NotBorrowed(BookId),

  #[error("attached value {attached} is below the borrowing minimum {minimum}")]
  InsufficientValue { attached: Amount, minimum: Amount },

  #[error("account {account} holds {balance}, {required} required")]
  InsufficientFunds {
    account:  Account,
    balance:  Amount,
    required: Amount,
  },

  #[error("balance of {0} would overflow")]
  BalanceOverflow(Account),

  #[error("invalid identity: {0:?}")]
  InvalidIdentity(String),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),

  #[error("registry is already initialized")]
  AlreadyInitialized,

  #[error("registry has not been initialized")]
  NotInitialized,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Implemented by backend error types so that upper layers (the HTTP API)
/// can tell a rejected operation apart from an infrastructure failure
/// without knowing the concrete backend.
pub trait AsDomainError {
  /// The domain failure behind this error, if it is one.
  fn as_domain(&self) -> Option<&Error>;
}

impl AsDomainError for Error {
  fn as_domain(&self) -> Option<&Error> { Some(self) }
}
