//! The transaction-scoped [`Ledger`] over the `balances` table.

use rusqlite::{Connection, OptionalExtension as _};
use shelf_core::{
  Error as CoreError,
  ledger::{Account, Amount, Ledger},
};

use crate::encode::{DecodeError, decode_amount, encode_amount};

/// Failure inside a write transaction: the database itself, or a rejected
/// registry rule. Either way the transaction is rolled back; only database
/// failures escape `tokio_rusqlite::Connection::call` as errors.
#[derive(Debug)]
pub enum TxError {
  Db(rusqlite::Error),
  Rejected(CoreError),
}

impl From<rusqlite::Error> for TxError {
  fn from(e: rusqlite::Error) -> Self { Self::Db(e) }
}

impl From<DecodeError> for TxError {
  fn from(e: DecodeError) -> Self { Self::Db(e.into()) }
}

impl From<CoreError> for TxError {
  fn from(e: CoreError) -> Self { Self::Rejected(e) }
}

/// Read a balance outside any write transaction. Unknown accounts are zero.
pub fn read_balance(conn: &Connection, account: &Account) -> rusqlite::Result<Amount> {
  let raw: Option<i64> = conn
    .query_row(
      "SELECT amount FROM balances WHERE account = ?1",
      rusqlite::params![account.key()],
      |r| r.get(0),
    )
    .optional()?;

  Ok(raw.map(decode_amount).transpose()?.unwrap_or_default())
}

/// A [`Ledger`] bound to the connection of an open transaction.
pub struct TxLedger<'c> {
  conn: &'c Connection,
}

impl<'c> TxLedger<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn } }
}

impl Ledger for TxLedger<'_> {
  type Error = TxError;

  fn balance(&self, account: &Account) -> Result<Amount, TxError> {
    Ok(read_balance(self.conn, account)?)
  }

  fn set_balance(&mut self, account: &Account, amount: Amount) -> Result<(), TxError> {
    let units =
      encode_amount(amount).ok_or_else(|| CoreError::BalanceOverflow(account.clone()))?;

    self.conn.execute(
      "INSERT INTO balances (account, amount) VALUES (?1, ?2)
       ON CONFLICT(account) DO UPDATE SET amount = excluded.amount",
      rusqlite::params![account.key(), units],
    )?;
    Ok(())
  }
}
