//! The fee schedule and the two value-moving protocols: the listing fee
//! charged when a book is added and the fee split applied on borrow.
//!
//! Both functions take the ledger by `&mut` and are meant to run inside the
//! same transaction as the state change they pay for; the caller rolls back
//! on any error.

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  identity::Identity,
  ledger::{Account, Amount, Ledger},
};

/// Default borrowing threshold and listing fee, in value units.
pub const DEFAULT_FEE: Amount = Amount::new(1_000_000_000_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
  /// Smallest value a borrower may attach to `borrow_book`.
  pub minimum_borrow_value: Amount,
  /// Fixed amount the registry pays the lister on `add_book`.
  pub listing_fee:          Amount,
}

impl Default for FeeSchedule {
  fn default() -> Self {
    Self { minimum_borrow_value: DEFAULT_FEE, listing_fee: DEFAULT_FEE }
  }
}

/// How a borrowing payment was apportioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
  pub owner:    Amount,
  pub registry: Amount,
}

/// Pay the listing fee out of the registry's funding to `lister`.
pub fn charge_listing<L: Ledger>(
  ledger: &mut L,
  lister: &Identity,
  fees: &FeeSchedule,
) -> Result<(), L::Error> {
  if fees.listing_fee.is_zero() {
    return Ok(());
  }
  ledger.debit(&Account::Registry, fees.listing_fee)?;
  ledger.credit(&Account::Holder(lister.clone()), fees.listing_fee)?;
  Ok(())
}

/// Take the full attached `value` from `borrower` and split it: half
/// (rounded down) to `owner`, the remainder to the registry. Nothing is
/// refunded.
pub fn settle_borrow<L: Ledger>(
  ledger: &mut L,
  borrower: &Identity,
  owner: &Identity,
  value: Amount,
  fees: &FeeSchedule,
) -> Result<FeeSplit, L::Error> {
  if value < fees.minimum_borrow_value {
    return Err(
      Error::InsufficientValue { attached: value, minimum: fees.minimum_borrow_value }.into(),
    );
  }

  let (owner_share, registry_share) = value.halve();
  ledger.debit(&Account::Holder(borrower.clone()), value)?;
  ledger.credit(&Account::Holder(owner.clone()), owner_share)?;
  ledger.credit(&Account::Registry, registry_share)?;

  Ok(FeeSplit { owner: owner_share, registry: registry_share })
}
