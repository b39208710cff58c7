//! Books and the lending state machine.
//!
//! ```text
//! Available --lend--> Borrowed --reclaim--> Available
//! ```
//!
//! There are no other states and no other transitions. Only the loan fields
//! (`borrower`, `state`, `borrowed_at`) ever change after a book is created.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{Error, Result, identity::Identity};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Sequential book id. The first book is `1`; ids are never reused.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BookId(u64);

impl BookId {
  pub const FIRST: Self = Self(1);

  pub const fn new(raw: u64) -> Self { Self(raw) }

  pub const fn get(self) -> u64 { self.0 }

  pub fn next(self) -> Self { Self(self.0.saturating_add(1)) }
}

impl fmt::Display for BookId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<u64> for BookId {
  fn from(raw: u64) -> Self { Self(raw) }
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookState {
  #[default]
  Available,
  Borrowed,
}

impl BookState {
  /// Numeric code used by the legacy record format.
  pub fn code(self) -> u8 {
    match self {
      Self::Available => 0,
      Self::Borrowed => 1,
    }
  }

  pub fn from_code(code: u8) -> Option<Self> {
    match code {
      0 => Some(Self::Available),
      1 => Some(Self::Borrowed),
      _ => None,
    }
  }
}

// ─── Book ────────────────────────────────────────────────────────────────────

/// Descriptive metadata supplied when a book is added. Immutable afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
  pub title:       String,
  pub author:      String,
  pub publisher:   String,
  pub image_url:   String,
  pub description: String,
  pub genre:       String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
  pub id:          BookId,
  #[serde(flatten)]
  pub details:     BookDetails,
  /// The member who added the book. Never changes.
  pub owner:       Identity,
  /// Present exactly when `state` is [`BookState::Borrowed`].
  pub borrower:    Option<Identity>,
  pub state:       BookState,
  pub added_at:    DateTime<Utc>,
  /// Present exactly when `state` is [`BookState::Borrowed`].
  pub borrowed_at: Option<DateTime<Utc>>,
}

impl Book {
  /// A newly listed, available book.
  pub fn new(id: BookId, details: BookDetails, owner: Identity, added_at: DateTime<Utc>) -> Self {
    Self {
      id,
      details,
      owner,
      borrower: None,
      state: BookState::Available,
      added_at,
      borrowed_at: None,
    }
  }

  pub fn is_available(&self) -> bool { self.state == BookState::Available }

  /// Whether `who` owns this book or currently has it on loan.
  pub fn is_held_by(&self, who: &Identity) -> bool {
    self.owner == *who || self.borrower.as_ref() == Some(who)
  }

  /// Available → Borrowed.
  pub fn lend(&mut self, borrower: Identity, at: DateTime<Utc>) -> Result<()> {
    if !self.is_available() {
      return Err(Error::AlreadyBorrowed(self.id));
    }
    self.borrower = Some(borrower);
    self.state = BookState::Borrowed;
    self.borrowed_at = Some(at);
    Ok(())
  }

  /// Borrowed → Available. Only the owner may reclaim a book.
  ///
  /// Returns the identity of the former borrower.
  pub fn reclaim(&mut self, caller: &Identity) -> Result<Identity> {
    if self.is_available() {
      return Err(Error::NotBorrowed(self.id));
    }
    if *caller != self.owner {
      return Err(Error::Unauthorized {
        caller: caller.clone(),
        action: "return a book they do not own",
      });
    }
    let borrower = self.borrower.take().ok_or(Error::NotBorrowed(self.id))?;
    self.state = BookState::Available;
    self.borrowed_at = None;
    Ok(borrower)
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// An ordered sequence of books with its length, as returned by the catalog
/// queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookListing {
  pub books: Vec<Book>,
  pub count: usize,
}

impl From<Vec<Book>> for BookListing {
  fn from(books: Vec<Book>) -> Self {
    let count = books.len();
    Self { books, count }
  }
}
