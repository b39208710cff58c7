//! Audit events: the append-only record of borrows, returns and ratings.
//!
//! Events hold copies of the ids and identities involved at the time of the
//! action, never references to live books or members. The log is ordered by
//! `seq`; timestamps are non-decreasing in `seq` order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, book::BookId, identity::Identity};

// ─── Rating ──────────────────────────────────────────────────────────────────

/// A review score from 1 to 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(score: u8) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&score) {
      Ok(Self(score))
    } else {
      Err(Error::InvalidRating(score))
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Rating {
  type Error = Error;

  fn try_from(score: u8) -> Result<Self> { Self::new(score) }
}

impl From<Rating> for u8 {
  fn from(r: Rating) -> Self { r.0 }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// The discriminant of an [`EventKind`], used for filtering and storage.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
  Borrow,
  Return,
  Rating,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
  Borrow { borrower: Identity },
  /// Carries the borrower whose loan ended, not the owner who ended it.
  Return { borrower: Identity },
  Rating {
    reviewer: Identity,
    rating:   Rating,
    comments: String,
  },
}

impl EventKind {
  pub fn event_type(&self) -> EventType {
    match self {
      Self::Borrow { .. } => EventType::Borrow,
      Self::Return { .. } => EventType::Return,
      Self::Rating { .. } => EventType::Rating,
    }
  }

  /// The identity the event is about: the borrower for loan events, the
  /// reviewer for ratings.
  pub fn actor(&self) -> &Identity {
    match self {
      Self::Borrow { borrower } | Self::Return { borrower } => borrower,
      Self::Rating { reviewer, .. } => reviewer,
    }
  }
}

/// One entry of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
  /// Position in the log, starting at 1.
  pub seq:         u64,
  pub event_id:    Uuid,
  pub book_id:     BookId,
  pub recorded_at: DateTime<Utc>,
  #[serde(flatten)]
  pub kind:        EventKind,
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Filter for [`crate::store::LibraryStore::events`]. Unset fields match
/// everything; all ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
  pub book_id:  Option<BookId>,
  pub kind:     Option<EventType>,
  pub from:     Option<DateTime<Utc>>,
  pub to:       Option<DateTime<Utc>>,
  pub from_seq: Option<u64>,
  pub to_seq:   Option<u64>,
  pub limit:    Option<usize>,
}

impl EventQuery {
  pub fn for_book(book_id: BookId) -> Self { Self { book_id: Some(book_id), ..Self::default() } }

  pub fn of_kind(mut self, kind: EventType) -> Self {
    self.kind = Some(kind);
    self
  }

  pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
    self.from = Some(from);
    self.to = Some(to);
    self
  }

  /// Whether `event` passes every filter. `limit` is not considered.
  pub fn matches(&self, event: &AuditEvent) -> bool {
    self.book_id.is_none_or(|b| b == event.book_id)
      && self.kind.is_none_or(|k| k == event.kind.event_type())
      && self.from.is_none_or(|t| event.recorded_at >= t)
      && self.to.is_none_or(|t| event.recorded_at <= t)
      && self.from_seq.is_none_or(|s| event.seq >= s)
      && self.to_seq.is_none_or(|s| event.seq <= s)
  }
}

// ─── Read-side aggregation ───────────────────────────────────────────────────

/// Aggregate of the ratings recorded for one book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
  pub book_id: BookId,
  pub count:   usize,
  pub total:   u64,
  /// `None` when the book has no ratings.
  pub average: Option<f64>,
}

impl RatingSummary {
  /// Fold the rating events for `book_id` out of `events`; other events are
  /// ignored.
  pub fn from_events<'a>(book_id: BookId, events: impl IntoIterator<Item = &'a AuditEvent>) -> Self {
    let (count, total) = events
      .into_iter()
      .filter(|e| e.book_id == book_id)
      .filter_map(|e| match &e.kind {
        EventKind::Rating { rating, .. } => Some(u64::from(rating.get())),
        _ => None,
      })
      .fold((0usize, 0u64), |(n, sum), r| (n + 1, sum + r));

    let average = (count > 0).then(|| total as f64 / count as f64);
    Self { book_id, count, total, average }
  }
}
