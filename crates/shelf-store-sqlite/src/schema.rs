//! SQL schema for the Shelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Members are never deleted; removal only flips `status`.
CREATE TABLE IF NOT EXISTS members (
    identity      TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'active' | 'removed'
    registered_at TEXT NOT NULL
);

-- Exactly one row once the registry has been initialized.
CREATE TABLE IF NOT EXISTS registry (
    singleton  INTEGER PRIMARY KEY CHECK (singleton = 1),
    owner      TEXT NOT NULL REFERENCES members(identity),
    created_at TEXT NOT NULL,
    last_tick  TEXT NOT NULL       -- monotonic clock, see `tick`
);

CREATE TABLE IF NOT EXISTS books (
    book_id     INTEGER PRIMARY KEY,
    title       TEXT NOT NULL,
    author      TEXT NOT NULL,
    publisher   TEXT NOT NULL,
    image_url   TEXT NOT NULL,
    description TEXT NOT NULL,
    genre       TEXT NOT NULL,
    owner       TEXT NOT NULL REFERENCES members(identity),
    borrower    TEXT,
    state       TEXT NOT NULL,     -- 'available' | 'borrowed'
    added_at    TEXT NOT NULL,
    borrowed_at TEXT,
    CHECK ((state = 'borrowed') = (borrower IS NOT NULL)),
    CHECK ((borrower IS NULL) = (borrowed_at IS NULL))
);

CREATE TABLE IF NOT EXISTS balances (
    account TEXT PRIMARY KEY,      -- identity, or '@registry'
    amount  INTEGER NOT NULL CHECK (amount >= 0)
);

-- The audit log is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id    TEXT NOT NULL UNIQUE,
    event_type  TEXT NOT NULL,     -- 'borrow' | 'return' | 'rating'
    book_id     INTEGER NOT NULL REFERENCES books(book_id),
    actor       TEXT NOT NULL,     -- borrower, or reviewer for ratings
    rating      INTEGER,
    comments    TEXT,
    recorded_at TEXT NOT NULL,
    CHECK ((event_type = 'rating') = (rating IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS books_owner_idx     ON books(owner);
CREATE INDEX IF NOT EXISTS books_borrower_idx  ON books(borrower);
CREATE INDEX IF NOT EXISTS events_book_idx     ON events(book_id);
CREATE INDEX IF NOT EXISTS events_recorded_idx ON events(recorded_at);

PRAGMA user_version = 1;
";
