//! Legacy record parser.

use std::str::FromStr;

use shelf_core::{book::BookState, identity::Identity};

use crate::{EMPTY_SENTINEL, Error, FIELD_COUNT, FIELD_DELIMITER, LegacyRecord, Result};

fn integer<T: FromStr>(field: &'static str, value: &str) -> Result<T> {
  value.parse().map_err(|_| Error::InvalidInteger { field, value: value.to_owned() })
}

fn identity(field: &'static str, value: &str) -> Result<Identity> {
  Identity::parse(value).map_err(|source| Error::InvalidIdentity { field, source })
}

fn state(value: &str) -> Result<BookState> {
  value
    .parse::<u8>()
    .ok()
    .and_then(BookState::from_code)
    .ok_or_else(|| Error::InvalidState(value.to_owned()))
}

pub(crate) fn parse_record(input: &str) -> Result<LegacyRecord> {
  let fields: Vec<&str> = input.split(FIELD_DELIMITER).collect();
  let [
    index,
    title,
    author,
    publisher,
    owner,
    borrower,
    state_code,
    added_at,
    borrowed_at,
    image_url,
    description,
    genre,
  ] = fields[..]
  else {
    return Err(Error::FieldCount { expected: FIELD_COUNT, found: fields.len() });
  };

  let borrower = match borrower {
    EMPTY_SENTINEL => None,
    b => Some(identity("borrower", b)?),
  };
  let borrowed_at = match integer::<i64>("borrowed_at", borrowed_at)? {
    0 => None,
    t => Some(t),
  };

  Ok(LegacyRecord {
    index: integer("index", index)?,
    title: title.to_owned(),
    author: author.to_owned(),
    publisher: publisher.to_owned(),
    owner: identity("owner", owner)?,
    borrower,
    state: state(state_code)?,
    added_at: integer("added_at", added_at)?,
    borrowed_at,
    image_url: image_url.to_owned(),
    description: description.to_owned(),
    genre: genre.to_owned(),
  })
}
