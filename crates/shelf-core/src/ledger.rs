//! Balances and the ledger capability.
//!
//! The ledger is the only place value lives. It is mutated exclusively by
//! the value-moving operations (registry funding, deposits, the listing fee
//! and the borrow fee split). Backends hand a transaction-scoped [`Ledger`]
//! to the functions in [`crate::fees`], so a failed debit aborts the whole
//! operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, identity::Identity};

// ─── Amount ──────────────────────────────────────────────────────────────────

/// A non-negative quantity of the smallest value unit.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
  pub const ZERO: Self = Self(0);

  pub const fn new(units: u64) -> Self { Self(units) }

  pub const fn units(self) -> u64 { self.0 }

  pub fn is_zero(self) -> bool { self.0 == 0 }

  pub fn checked_add(self, other: Self) -> Option<Self> {
    self.0.checked_add(other.0).map(Self)
  }

  pub fn checked_sub(self, other: Self) -> Option<Self> {
    self.0.checked_sub(other.0).map(Self)
  }

  /// Split into `(floor(self / 2), remainder)`. The two halves always sum
  /// back to `self`.
  pub fn halve(self) -> (Self, Self) {
    let half = self.0 / 2;
    (Self(half), Self(self.0 - half))
  }
}

impl fmt::Display for Amount {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<u64> for Amount {
  fn from(units: u64) -> Self { Self(units) }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A ledger key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identity", rename_all = "snake_case")]
pub enum Account {
  /// The registry's own balance, funded at initialization and fed by fees.
  Registry,
  /// The balance of an external holder (member or not).
  Holder(Identity),
}

impl Account {
  /// The ledger key used for the registry account. Identities can never
  /// start with `@`, so this cannot collide with a holder.
  pub const REGISTRY_KEY: &'static str = "@registry";

  pub fn key(&self) -> &str {
    match self {
      Self::Registry => Self::REGISTRY_KEY,
      Self::Holder(id) => id.as_str(),
    }
  }
}

impl fmt::Display for Account {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.key()) }
}

impl From<Identity> for Account {
  fn from(id: Identity) -> Self { Self::Holder(id) }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Read and write access to account balances.
///
/// Implementors supply [`balance`](Ledger::balance) and
/// [`set_balance`](Ledger::set_balance); `credit` and `debit` are derived and
/// perform the overflow and sufficiency checks.
pub trait Ledger {
  type Error: From<Error>;

  fn balance(&self, account: &Account) -> Result<Amount, Self::Error>;

  fn set_balance(&mut self, account: &Account, amount: Amount) -> Result<(), Self::Error>;

  /// Add `amount` to `account`, returning the new balance.
  fn credit(&mut self, account: &Account, amount: Amount) -> Result<Amount, Self::Error> {
    let next = self
      .balance(account)?
      .checked_add(amount)
      .ok_or_else(|| Error::BalanceOverflow(account.clone()))?;
    self.set_balance(account, next)?;
    Ok(next)
  }

  /// Remove `amount` from `account`, returning the new balance. Fails with
  /// [`Error::InsufficientFunds`] without touching the balance if it cannot
  /// be covered.
  fn debit(&mut self, account: &Account, amount: Amount) -> Result<Amount, Self::Error> {
    let balance = self.balance(account)?;
    let next = balance.checked_sub(amount).ok_or_else(|| Error::InsufficientFunds {
      account: account.clone(),
      balance,
      required: amount,
    })?;
    self.set_balance(account, next)?;
    Ok(next)
  }
}

/// A ledger held in memory. Unknown accounts read as zero.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryLedger {
  balances: std::collections::HashMap<Account, Amount>,
}

#[cfg(test)]
impl MemoryLedger {
  pub(crate) fn new() -> Self { Self::default() }
}

#[cfg(test)]
impl Ledger for MemoryLedger {
  type Error = Error;

  fn balance(&self, account: &Account) -> Result<Amount, Error> {
    Ok(self.balances.get(account).copied().unwrap_or_default())
  }

  fn set_balance(&mut self, account: &Account, amount: Amount) -> Result<(), Error> {
    self.balances.insert(account.clone(), amount);
    Ok(())
  }
}
