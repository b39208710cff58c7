//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with exactly six fractional
//! digits and a `Z` suffix, so lexicographic order equals chronological
//! order and range filters can run in SQL. Enums are stored as their
//! snake_case names. Ids and amounts are stored as `INTEGER`.

use std::{error::Error as StdError, str::FromStr};

use chrono::{DateTime, SecondsFormat, SubsecRound as _, TimeDelta, Utc};
use rusqlite::{Row, types::Type};
use shelf_core::{
  book::{Book, BookDetails, BookId, BookState},
  event::{AuditEvent, EventKind, EventType, Rating},
  identity::Identity,
  ledger::Amount,
  member::{Member, MemberStatus},
};
use thiserror::Error;
use uuid::Uuid;

// ─── Decode failures ─────────────────────────────────────────────────────────

/// A stored value that no longer decodes into its domain type.
///
/// Decoding happens inside `tokio_rusqlite` calls, so this converts into a
/// [`rusqlite::Error`] and surfaces as a database error.
#[derive(Debug, Error)]
#[error("cannot decode {column}: {reason}")]
pub struct DecodeError {
  column: &'static str,
  reason: String,
}

impl DecodeError {
  fn new(column: &'static str, reason: impl ToString) -> Self {
    Self { column, reason: reason.to_string() }
  }
}

impl From<DecodeError> for rusqlite::Error {
  fn from(e: DecodeError) -> Self {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
  }
}

fn parse_column<T>(column: &'static str, s: &str) -> Result<T, DecodeError>
where
  T: FromStr,
  T::Err: StdError,
{
  s.parse().map_err(|e| DecodeError::new(column, e))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

/// Round `dt` up to the next whole microsecond. Used for inclusive lower
/// bounds, which must not admit anything stored before them.
pub fn ceil_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
  let floor = dt.trunc_subsecs(6);
  if floor < dt { floor + TimeDelta::microseconds(1) } else { floor }
}

pub fn decode_dt(column: &'static str, s: &str) -> Result<DateTime<Utc>, DecodeError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| DecodeError::new(column, e))
}

// ─── Ids and amounts ─────────────────────────────────────────────────────────

/// Ids beyond `i64::MAX` cannot exist in the table; they saturate and so
/// simply never match a row.
pub fn encode_book_id(id: BookId) -> i64 { i64::try_from(id.get()).unwrap_or(i64::MAX) }

pub fn decode_book_id(raw: i64) -> Result<BookId, DecodeError> {
  u64::try_from(raw).map(BookId::new).map_err(|e| DecodeError::new("book_id", e))
}

pub fn encode_amount(amount: Amount) -> Option<i64> { i64::try_from(amount.units()).ok() }

pub fn decode_amount(raw: i64) -> Result<Amount, DecodeError> {
  u64::try_from(raw).map(Amount::new).map_err(|e| DecodeError::new("amount", e))
}

pub fn decode_seq(raw: i64) -> Result<u64, DecodeError> {
  u64::try_from(raw).map_err(|e| DecodeError::new("seq", e))
}

pub fn decode_identity(column: &'static str, s: String) -> Result<Identity, DecodeError> {
  Identity::parse(s).map_err(|e| DecodeError::new(column, e))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const MEMBER_COLUMNS: &str = "identity, name, status, registered_at";

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub identity:      String,
  pub name:          String,
  pub status:        String,
  pub registered_at: String,
}

impl RawMember {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity:      row.get(0)?,
      name:          row.get(1)?,
      status:        row.get(2)?,
      registered_at: row.get(3)?,
    })
  }

  pub fn into_member(self) -> Result<Member, DecodeError> {
    Ok(Member {
      identity:      decode_identity("identity", self.identity)?,
      name:          self.name,
      status:        parse_column::<MemberStatus>("status", &self.status)?,
      registered_at: decode_dt("registered_at", &self.registered_at)?,
    })
  }
}

pub const BOOK_COLUMNS: &str = "book_id, title, author, publisher, image_url, description, genre,
   owner, borrower, state, added_at, borrowed_at";

/// Raw values read directly from a `books` row.
pub struct RawBook {
  pub book_id:     i64,
  pub details:     BookDetails,
  pub owner:       String,
  pub borrower:    Option<String>,
  pub state:       String,
  pub added_at:    String,
  pub borrowed_at: Option<String>,
}

impl RawBook {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      book_id:     row.get(0)?,
      details:     BookDetails {
        title:       row.get(1)?,
        author:      row.get(2)?,
        publisher:   row.get(3)?,
        image_url:   row.get(4)?,
        description: row.get(5)?,
        genre:       row.get(6)?,
      },
      owner:       row.get(7)?,
      borrower:    row.get(8)?,
      state:       row.get(9)?,
      added_at:    row.get(10)?,
      borrowed_at: row.get(11)?,
    })
  }

  pub fn into_book(self) -> Result<Book, DecodeError> {
    Ok(Book {
      id:          decode_book_id(self.book_id)?,
      details:     self.details,
      owner:       decode_identity("owner", self.owner)?,
      borrower:    self
        .borrower
        .map(|b| decode_identity("borrower", b))
        .transpose()?,
      state:       parse_column::<BookState>("state", &self.state)?,
      added_at:    decode_dt("added_at", &self.added_at)?,
      borrowed_at: self
        .borrowed_at
        .as_deref()
        .map(|s| decode_dt("borrowed_at", s))
        .transpose()?,
    })
  }
}

pub const EVENT_COLUMNS: &str =
  "seq, event_id, event_type, book_id, actor, rating, comments, recorded_at";

/// Raw values read directly from an `events` row.
pub struct RawEvent {
  pub seq:         i64,
  pub event_id:    String,
  pub event_type:  String,
  pub book_id:     i64,
  pub actor:       String,
  pub rating:      Option<i64>,
  pub comments:    Option<String>,
  pub recorded_at: String,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      seq:         row.get(0)?,
      event_id:    row.get(1)?,
      event_type:  row.get(2)?,
      book_id:     row.get(3)?,
      actor:       row.get(4)?,
      rating:      row.get(5)?,
      comments:    row.get(6)?,
      recorded_at: row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<AuditEvent, DecodeError> {
    let actor = decode_identity("actor", self.actor)?;
    let kind = match parse_column::<EventType>("event_type", &self.event_type)? {
      EventType::Borrow => EventKind::Borrow { borrower: actor },
      EventType::Return => EventKind::Return { borrower: actor },
      EventType::Rating => {
        let score = self
          .rating
          .and_then(|r| u8::try_from(r).ok())
          .ok_or_else(|| DecodeError::new("rating", "missing or out of range"))?;
        EventKind::Rating {
          reviewer: actor,
          rating:   Rating::new(score).map_err(|e| DecodeError::new("rating", e))?,
          comments: self.comments.unwrap_or_default(),
        }
      }
    };

    Ok(AuditEvent {
      seq: decode_seq(self.seq)?,
      event_id: Uuid::parse_str(&self.event_id).map_err(|e| DecodeError::new("event_id", e))?,
      book_id: decode_book_id(self.book_id)?,
      recorded_at: decode_dt("recorded_at", &self.recorded_at)?,
      kind,
    })
  }
}
