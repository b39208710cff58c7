//! Codec for the legacy delimited book record format.
//!
//! A record is twelve fields joined by `;`, and a list of records is joined
//! by `|`:
//!
//! ```text
//! index;title;author;publisher;owner;borrower;state;addedAt;borrowedAt;imageUrl;description;genre
//! ```
//!
//! `state` is `0` (available) or `1` (borrowed), timestamps are unix
//! seconds, and an absent borrower or borrow time is written as `0`. Pure
//! synchronous; no HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use shelf_legacy::parse_list;
//!
//! let records = parse_list("1;1984;Orwell;Secker;john;0;0;1700000000;0;;;Dystopian").unwrap();
//! println!("{} record(s), first is {:?}", records.len(), records[0].title);
//! ```

pub mod error;
mod parse;
mod serialize;

use shelf_core::{
  book::{Book, BookState},
  identity::Identity,
};

pub use error::{Error, Result};

pub const FIELD_DELIMITER: char = ';';
pub const RECORD_DELIMITER: char = '|';
pub const FIELD_COUNT: usize = 12;
/// Written in place of an absent borrower or borrow time.
pub const EMPTY_SENTINEL: &str = "0";

// ─── Public types ────────────────────────────────────────────────────────────

/// One book as the legacy format sees it.
///
/// Timestamps are whole unix seconds, so converting a [`Book`] into a
/// record drops sub-second precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyRecord {
  pub index:       u64,
  pub title:       String,
  pub author:      String,
  pub publisher:   String,
  pub owner:       Identity,
  pub borrower:    Option<Identity>,
  pub state:       BookState,
  pub added_at:    i64,
  pub borrowed_at: Option<i64>,
  pub image_url:   String,
  pub description: String,
  pub genre:       String,
}

impl From<&Book> for LegacyRecord {
  fn from(book: &Book) -> Self {
    let d = &book.details;
    Self {
      index:       book.id.get(),
      title:       d.title.clone(),
      author:      d.author.clone(),
      publisher:   d.publisher.clone(),
      owner:       book.owner.clone(),
      borrower:    book.borrower.clone(),
      state:       book.state,
      added_at:    book.added_at.timestamp(),
      borrowed_at: book.borrowed_at.map(|t| t.timestamp()),
      image_url:   d.image_url.clone(),
      description: d.description.clone(),
      genre:       d.genre.clone(),
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Encode one book as a single record.
pub fn encode_book(book: &Book) -> Result<String> {
  serialize::encode_record(&LegacyRecord::from(book))
}

/// Encode books as `|`-joined records, in the order given. An empty slice
/// encodes to the empty string.
pub fn encode_books<'a>(books: impl IntoIterator<Item = &'a Book>) -> Result<String> {
  let records = books
    .into_iter()
    .map(encode_book)
    .collect::<Result<Vec<_>>>()?;
  Ok(records.join(&RECORD_DELIMITER.to_string()))
}

/// Parse a single record.
pub fn parse_record(input: &str) -> Result<LegacyRecord> { parse::parse_record(input) }

/// Parse `|`-joined records. The empty string is an empty list.
pub fn parse_list(input: &str) -> Result<Vec<LegacyRecord>> {
  if input.is_empty() {
    return Ok(Vec::new());
  }
  input.split(RECORD_DELIMITER).map(parse::parse_record).collect()
}
