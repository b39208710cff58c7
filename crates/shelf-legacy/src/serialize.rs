//! Legacy record serializer.

use crate::{EMPTY_SENTINEL, Error, FIELD_DELIMITER, LegacyRecord, RECORD_DELIMITER, Result};

fn check_text(field: &'static str, value: &str) -> Result<()> {
  if value.contains([FIELD_DELIMITER, RECORD_DELIMITER]) {
    return Err(Error::ReservedDelimiter { field });
  }
  Ok(())
}

/// Render `record` as one delimited line, refusing values that would make
/// it ambiguous to parse back.
pub(crate) fn encode_record(record: &LegacyRecord) -> Result<String> {
  check_text("title", &record.title)?;
  check_text("author", &record.author)?;
  check_text("publisher", &record.publisher)?;
  check_text("image_url", &record.image_url)?;
  check_text("description", &record.description)?;
  check_text("genre", &record.genre)?;

  let borrower = match &record.borrower {
    Some(b) if b.as_str() == EMPTY_SENTINEL => {
      return Err(Error::SentinelCollision { field: "borrower" });
    }
    Some(b) => b.as_str(),
    None => EMPTY_SENTINEL,
  };

  let fields = [
    record.index.to_string(),
    record.title.clone(),
    record.author.clone(),
    record.publisher.clone(),
    record.owner.to_string(),
    borrower.to_owned(),
    record.state.code().to_string(),
    record.added_at.to_string(),
    record.borrowed_at.unwrap_or(0).to_string(),
    record.image_url.clone(),
    record.description.clone(),
    record.genre.clone(),
  ];

  Ok(fields.join(&FIELD_DELIMITER.to_string()))
}

#[cfg(test)]
mod tests {
  use shelf_core::{book::BookState, identity::Identity};

  use super::*;

  fn record() -> LegacyRecord {
    LegacyRecord {
      index:       1,
      title:       "1984".into(),
      author:      "George Orwell".into(),
      publisher:   "Secker & Warburg".into(),
      owner:       Identity::parse("john").unwrap(),
      borrower:    None,
      state:       BookState::Available,
      added_at:    1_700_000_000,
      borrowed_at: None,
      image_url:   "https://covers.example/1984.jpg".into(),
      description: "Big Brother".into(),
      genre:       "Dystopian".into(),
    }
  }

  #[test]
  fn fields_follow_positional_order() {
    assert_eq!(
      encode_record(&record()).unwrap(),
      "1;1984;George Orwell;Secker & Warburg;john;0;0;1700000000;0;\
       https://covers.example/1984.jpg;Big Brother;Dystopian"
    );
  }

  #[test]
  fn borrowed_record_writes_borrower_and_time() {
    let r = LegacyRecord {
      borrower: Some(Identity::parse("mary").unwrap()),
      state: BookState::Borrowed,
      borrowed_at: Some(1_700_000_500),
      ..record()
    };
    let line = encode_record(&r).unwrap();
    let fields: Vec<_> = line.split(';').collect();
    assert_eq!(fields[5], "mary");
    assert_eq!(fields[6], "1");
    assert_eq!(fields[8], "1700000500");
  }

  #[test]
  fn delimiters_in_text_are_refused() {
    let r = LegacyRecord { title: "War; and Peace".into(), ..record() };
    assert!(matches!(encode_record(&r), Err(Error::ReservedDelimiter { field: "title" })));

    let r = LegacyRecord { genre: "sci|fi".into(), ..record() };
    assert!(matches!(encode_record(&r), Err(Error::ReservedDelimiter { field: "genre" })));
  }

  #[test]
  fn borrower_named_zero_is_refused() {
    let r = LegacyRecord {
      borrower: Some(Identity::parse("0").unwrap()),
      state: BookState::Borrowed,
      borrowed_at: Some(1),
      ..record()
    };
    assert!(matches!(
      encode_record(&r),
      Err(Error::SentinelCollision { field: "borrower" })
    ));
  }
}
