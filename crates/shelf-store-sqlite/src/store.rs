//! [`SqliteStore`]: the SQLite implementation of [`LibraryStore`].

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use shelf_core::{
  Error as CoreError,
  book::{Book, BookDetails, BookId, BookListing},
  event::{AuditEvent, EventKind, EventQuery, Rating},
  fees::{FeeSchedule, charge_listing, settle_borrow},
  identity::Identity,
  ledger::{Account, Amount, Ledger as _},
  member::{Member, MemberStatus},
  store::LibraryStore,
};

use crate::{
  Error, Result,
  encode::{
    BOOK_COLUMNS, EVENT_COLUMNS, MEMBER_COLUMNS, RawBook, RawEvent, RawMember, decode_book_id,
    ceil_micros, decode_dt, decode_seq, encode_book_id, encode_dt,
  },
  ledger::{TxError, TxLedger, read_balance},
  schema::SCHEMA,
};

/// How many committed events a slow live subscriber may fall behind before
/// it starts missing them.
const FEED_CAPACITY: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Shelf registry backed by a single SQLite file.
///
/// Cloning is cheap. The inner connection and the live event feed are
/// reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
  fees: FeeSchedule,
  feed: broadcast::Sender<AuditEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>, fees: FeeSchedule) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn, fees).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(fees: FeeSchedule) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn, fees).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection, fees: FeeSchedule) -> Result<Self> {
    let (feed, _) = broadcast::channel(FEED_CAPACITY);
    let store = Self { conn, fees, feed };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// The fee schedule this store charges.
  pub fn fees(&self) -> FeeSchedule { self.fees }

  /// Receive every audit event as soon as its transaction has committed,
  /// in `seq` order.
  ///
  /// Delivery is best-effort: a subscriber that falls more than a few
  /// hundred events behind sees `RecvError::Lagged`, and the log stays the
  /// source of truth via [`LibraryStore::events`].
  pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> { self.feed.subscribe() }

  /// Run `f` inside one `IMMEDIATE` transaction.
  ///
  /// Commits only if `f` succeeds. A rejected rule rolls everything back and
  /// comes out as [`Error::Core`].
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, TxError> + Send + 'static,
  {
    self.transact(f, |_| ()).await
  }

  /// Like [`Self::write`] for mutations that append an event. The event is
  /// published right after commit, still on the connection thread, so the
  /// feed sees events in the same order as their `seq`.
  async fn write_event<T, F>(&self, f: F) -> Result<(T, AuditEvent)>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<(T, AuditEvent), TxError> + Send + 'static,
  {
    let feed = self.feed.clone();
    self
      .transact(f, move |(_, event): &(T, AuditEvent)| {
        // Err only means nobody is listening right now.
        let _ = feed.send(event.clone());
      })
      .await
  }

  async fn transact<T, F, C>(&self, f: F, on_commit: C) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, TxError> + Send + 'static,
    C: FnOnce(&T) + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&tx) {
          Ok(value) => {
            tx.commit()?;
            on_commit(&value);
            Ok(Ok(value))
          }
          Err(TxError::Rejected(e)) => Ok(Err(e)),
          Err(TxError::Db(e)) => Err(e.into()),
        }
      })
      .await?;

    outcome.map_err(Error::Core)
  }

  /// Run a read-only closure on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
  {
    Ok(self.conn.call(move |conn| Ok(f(conn)?)).await?)
  }
}

// ─── Transaction helpers ─────────────────────────────────────────────────────

fn is_initialized(conn: &Connection) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM registry WHERE singleton = 1", [], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// Fail with [`CoreError::NotInitialized`] unless the registry row exists.
fn ensure_initialized(conn: &Connection) -> Result<(), TxError> {
  if is_initialized(conn)? { Ok(()) } else { Err(CoreError::NotInitialized.into()) }
}

/// Advance the registry clock and return the timestamp for this operation:
/// the wall clock, but never earlier than the previous tick.
fn tick(conn: &Connection) -> Result<DateTime<Utc>, TxError> {
  let last: Option<String> = conn
    .query_row("SELECT last_tick FROM registry WHERE singleton = 1", [], |r| r.get(0))
    .optional()?;
  let last = last.ok_or(CoreError::NotInitialized)?;
  let last = decode_dt("last_tick", &last)?;

  let now = Utc::now().trunc_subsecs(6).max(last);
  conn.execute(
    "UPDATE registry SET last_tick = ?1 WHERE singleton = 1",
    rusqlite::params![encode_dt(now)],
  )?;
  Ok(now)
}

fn load_member(conn: &Connection, identity: &Identity) -> rusqlite::Result<Option<Member>> {
  let raw = conn
    .query_row(
      &format!("SELECT {MEMBER_COLUMNS} FROM members WHERE identity = ?1"),
      rusqlite::params![identity.as_str()],
      RawMember::from_row,
    )
    .optional()?;

  Ok(raw.map(RawMember::into_member).transpose()?)
}

fn insert_member(conn: &Connection, member: &Member) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    "INSERT INTO members (identity, name, status, registered_at) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(identity) DO NOTHING",
    rusqlite::params![
      member.identity.as_str(),
      member.name,
      member.status.to_string(),
      encode_dt(member.registered_at),
    ],
  )?;
  Ok(inserted == 1)
}

fn load_book(conn: &Connection, id: BookId) -> rusqlite::Result<Option<Book>> {
  let raw = conn
    .query_row(
      &format!("SELECT {BOOK_COLUMNS} FROM books WHERE book_id = ?1"),
      rusqlite::params![encode_book_id(id)],
      RawBook::from_row,
    )
    .optional()?;

  Ok(raw.map(RawBook::into_book).transpose()?)
}

/// All books, or only those `holder` owns or borrows, in id order.
fn query_books(conn: &Connection, holder: Option<&Identity>) -> rusqlite::Result<Vec<Book>> {
  let holder = holder.map(Identity::as_str);
  let mut stmt = conn.prepare(&format!(
    "SELECT {BOOK_COLUMNS} FROM books
     WHERE ?1 IS NULL OR owner = ?1 OR borrower = ?1
     ORDER BY book_id"
  ))?;

  let raws = stmt
    .query_map(rusqlite::params![holder], RawBook::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| raw.into_book().map_err(rusqlite::Error::from))
    .collect()
}

fn insert_book(conn: &Connection, book: &Book) -> rusqlite::Result<()> {
  let d = &book.details;
  conn.execute(
    "INSERT INTO books (
       book_id, title, author, publisher, image_url, description, genre,
       owner, borrower, state, added_at, borrowed_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    rusqlite::params![
      encode_book_id(book.id),
      d.title,
      d.author,
      d.publisher,
      d.image_url,
      d.description,
      d.genre,
      book.owner.as_str(),
      book.borrower.as_ref().map(Identity::as_str),
      book.state.to_string(),
      encode_dt(book.added_at),
      book.borrowed_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

/// Persist the loan fields of `book`; nothing else is ever updated.
fn save_loan(conn: &Connection, book: &Book) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE books SET borrower = ?2, state = ?3, borrowed_at = ?4 WHERE book_id = ?1",
    rusqlite::params![
      encode_book_id(book.id),
      book.borrower.as_ref().map(Identity::as_str),
      book.state.to_string(),
      book.borrowed_at.map(encode_dt),
    ],
  )?;
  Ok(())
}

fn append_event(
  conn: &Connection,
  book_id: BookId,
  kind: EventKind,
  at: DateTime<Utc>,
) -> Result<AuditEvent, TxError> {
  let event_id = Uuid::new_v4();
  let (rating, comments) = match &kind {
    EventKind::Rating { rating, comments, .. } => (Some(rating.get()), Some(comments.as_str())),
    EventKind::Borrow { .. } | EventKind::Return { .. } => (None, None),
  };

  conn.execute(
    "INSERT INTO events (event_id, event_type, book_id, actor, rating, comments, recorded_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      event_id.hyphenated().to_string(),
      kind.event_type().to_string(),
      encode_book_id(book_id),
      kind.actor().as_str(),
      rating,
      comments,
      encode_dt(at),
    ],
  )?;

  Ok(AuditEvent {
    seq: decode_seq(conn.last_insert_rowid())?,
    event_id,
    book_id,
    recorded_at: at,
    kind,
  })
}

// ─── LibraryStore impl ───────────────────────────────────────────────────────

impl LibraryStore for SqliteStore {
  type Error = Error;

  // ── Registry ──────────────────────────────────────────────────────────────

  async fn initialize(&self, owner_name: String, owner: Identity, funding: Amount) -> Result<Member> {
    let member = self
      .write(move |conn| {
        if is_initialized(conn)? {
          return Err(CoreError::AlreadyInitialized.into());
        }

        let now = Utc::now().trunc_subsecs(6);
        let member = Member::new(owner, owner_name, now);
        insert_member(conn, &member)?;
        conn.execute(
          "INSERT INTO registry (singleton, owner, created_at, last_tick) VALUES (1, ?1, ?2, ?2)",
          rusqlite::params![member.identity.as_str(), encode_dt(now)],
        )?;
        TxLedger::new(conn).credit(&Account::Registry, funding)?;
        Ok(member)
      })
      .await?;

    info!(owner = %member.identity, %funding, "registry initialized");
    Ok(member)
  }

  async fn owner(&self) -> Result<Option<Member>> {
    self
      .read(|conn| {
        let raw = conn
          .query_row(
            "SELECT m.identity, m.name, m.status, m.registered_at
             FROM registry r JOIN members m ON m.identity = r.owner",
            [],
            RawMember::from_row,
          )
          .optional()?;
        Ok(raw.map(RawMember::into_member).transpose()?)
      })
      .await
  }

  // ── Members ───────────────────────────────────────────────────────────────

  async fn add_member(&self, name: String, identity: Identity) -> Result<bool> {
    let log_id = identity.clone();
    let created = self
      .write(move |conn| {
        let now = tick(conn)?;
        Ok(insert_member(conn, &Member::new(identity, name, now))?)
      })
      .await?;

    if created {
      info!(member = %log_id, "member added");
    } else {
      debug!(member = %log_id, "member already registered; nothing to do");
    }
    Ok(created)
  }

  async fn remove_member(&self, identity: Identity) -> Result<bool> {
    let log_id = identity.clone();
    let known = self
      .write(move |conn| {
        ensure_initialized(conn)?;
        let changed = conn.execute(
          "UPDATE members SET status = ?2 WHERE identity = ?1",
          rusqlite::params![identity.as_str(), MemberStatus::Removed.to_string()],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if known {
      info!(member = %log_id, "member removed");
    } else {
      debug!(member = %log_id, "remove for unknown identity; nothing to do");
    }
    Ok(known)
  }

  async fn get_member(&self, identity: Identity) -> Result<Option<Member>> {
    self.read(move |conn| load_member(conn, &identity)).await
  }

  async fn member_count(&self) -> Result<u64> {
    self
      .read(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM members", [], |r| r.get(0))?;
        Ok(n.unsigned_abs())
      })
      .await
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn add_book(&self, caller: Identity, details: BookDetails) -> Result<Book> {
    let fees = self.fees;
    let book = self
      .write(move |conn| {
        let now = tick(conn)?;

        let active = load_member(conn, &caller)?.is_some_and(|m| m.is_active());
        if !active {
          return Err(CoreError::Unauthorized { caller, action: "add a book" }.into());
        }

        charge_listing(&mut TxLedger::new(conn), &caller, &fees)?;

        let next: i64 =
          conn.query_row("SELECT COALESCE(MAX(book_id), 0) + 1 FROM books", [], |r| r.get(0))?;
        let book = Book::new(decode_book_id(next)?, details, caller, now);
        insert_book(conn, &book)?;
        Ok(book)
      })
      .await
      .inspect_err(|e| debug!(error = %e, "add_book rejected"))?;

    info!(book = %book.id, owner = %book.owner, title = %book.details.title, "book added");
    Ok(book)
  }

  async fn get_book(&self, id: BookId) -> Result<Book> {
    self
      .read(move |conn| load_book(conn, id))
      .await?
      .ok_or(Error::Core(CoreError::NotFound(id)))
  }

  async fn all_books(&self) -> Result<BookListing> {
    let books = self.read(|conn| query_books(conn, None)).await?;
    Ok(BookListing::from(books))
  }

  async fn my_books(&self, caller: Identity) -> Result<BookListing> {
    let books = self.read(move |conn| query_books(conn, Some(&caller))).await?;
    Ok(BookListing::from(books))
  }

  async fn book_count(&self) -> Result<u64> {
    self
      .read(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))?;
        Ok(n.unsigned_abs())
      })
      .await
  }

  // ── Lending ───────────────────────────────────────────────────────────────

  async fn borrow_book(&self, caller: Identity, id: BookId, value: Amount) -> Result<Book> {
    let fees = self.fees;
    let (book, event) = self
      .write_event(move |conn| {
        let now = tick(conn)?;
        let mut book = load_book(conn, id)?.ok_or(CoreError::NotFound(id))?;

        book.lend(caller.clone(), now)?;
        let split = settle_borrow(&mut TxLedger::new(conn), &caller, &book.owner, value, &fees)?;
        debug!(book = %id, owner_share = %split.owner, registry_share = %split.registry, "fee split");

        save_loan(conn, &book)?;
        let event = append_event(conn, id, EventKind::Borrow { borrower: caller }, now)?;
        Ok((book, event))
      })
      .await
      .inspect_err(|e| debug!(book = %id, error = %e, "borrow rejected"))?;

    info!(book = %id, borrower = %event.kind.actor(), %value, seq = event.seq, "book borrowed");
    Ok(book)
  }

  async fn return_book(&self, caller: Identity, id: BookId) -> Result<Book> {
    let (book, event) = self
      .write_event(move |conn| {
        let now = tick(conn)?;
        let mut book = load_book(conn, id)?.ok_or(CoreError::NotFound(id))?;

        let borrower = book.reclaim(&caller)?;
        save_loan(conn, &book)?;
        let event = append_event(conn, id, EventKind::Return { borrower }, now)?;
        Ok((book, event))
      })
      .await
      .inspect_err(|e| debug!(book = %id, error = %e, "return rejected"))?;

    info!(book = %id, borrower = %event.kind.actor(), seq = event.seq, "book returned");
    Ok(book)
  }

  // ── Audit log ─────────────────────────────────────────────────────────────

  async fn rate_book(
    &self,
    reviewer: Identity,
    id: BookId,
    rating: Rating,
    comments: String,
  ) -> Result<AuditEvent> {
    let ((), event) = self
      .write_event(move |conn| {
        let now = tick(conn)?;
        if load_book(conn, id)?.is_none() {
          return Err(CoreError::NotFound(id).into());
        }
        let event = append_event(conn, id, EventKind::Rating { reviewer, rating, comments }, now)?;
        Ok(((), event))
      })
      .await
      .inspect_err(|e| debug!(book = %id, error = %e, "rating rejected"))?;

    info!(
      book = %id,
      reviewer = %event.kind.actor(),
      rating = rating.get(),
      seq = event.seq,
      "book rated"
    );
    Ok(event)
  }

  async fn events(&self, query: &EventQuery) -> Result<Vec<AuditEvent>> {
    let book_id = query.book_id.map(encode_book_id);
    let kind = query.kind.map(|k| k.to_string());
    // Stored times are whole microseconds.
    let from = query.from.map(|t| encode_dt(ceil_micros(t)));
    let to = query.to.map(encode_dt);
    let from_seq = query.from_seq.map(|s| i64::try_from(s).unwrap_or(i64::MAX));
    let to_seq = query.to_seq.map(|s| i64::try_from(s).unwrap_or(i64::MAX));
    // SQLite treats a negative LIMIT as "no limit".
    let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events
           WHERE (?1 IS NULL OR book_id = ?1)
             AND (?2 IS NULL OR event_type = ?2)
             AND (?3 IS NULL OR recorded_at >= ?3)
             AND (?4 IS NULL OR recorded_at <= ?4)
             AND (?5 IS NULL OR seq >= ?5)
             AND (?6 IS NULL OR seq <= ?6)
           ORDER BY seq
           LIMIT ?7"
        ))?;

        let raws = stmt
          .query_map(
            rusqlite::params![book_id, kind, from, to, from_seq, to_seq, limit],
            RawEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        raws
          .into_iter()
          .map(|raw| raw.into_event().map_err(rusqlite::Error::from))
          .collect()
      })
      .await
  }

  // ── Ledger ────────────────────────────────────────────────────────────────

  async fn balance(&self, account: Account) -> Result<Amount> {
    self.read(move |conn| read_balance(conn, &account)).await
  }

  async fn deposit(&self, holder: Identity, amount: Amount) -> Result<Amount> {
    let log_id = holder.clone();
    let balance = self
      .write(move |conn| {
        ensure_initialized(conn)?;
        TxLedger::new(conn).credit(&Account::Holder(holder), amount)
      })
      .await?;

    debug!(holder = %log_id, %amount, %balance, "deposit");
    Ok(balance)
  }
}
