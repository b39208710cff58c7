//! Handlers for registry-wide state and the ledger.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/registry` | Owner, counts and the registry balance |
//! | `GET`  | `/balances/registry` | The registry's own account |
//! | `GET`  | `/balances/:identity` | Zero for accounts never touched |
//! | `POST` | `/deposits` | Body: `{"identity":"john","amount":1000}`; credits a holder |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shelf_core::{
  identity::Identity,
  ledger::{Account, Amount},
  member::Member,
  store::LibraryStore,
};

use crate::error::ApiError;

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RegistrySummary {
  /// `None` until the registry has been initialized.
  pub owner:   Option<Member>,
  pub members: u64,
  pub books:   u64,
  pub balance: Amount,
}

/// `GET /registry`
pub async fn summary<S>(State(store): State<Arc<S>>) -> Result<Json<RegistrySummary>, ApiError>
where
  S: LibraryStore,
{
  let owner = store.owner().await.map_err(ApiError::from_store)?;
  let members = store.member_count().await.map_err(ApiError::from_store)?;
  let books = store.book_count().await.map_err(ApiError::from_store)?;
  let balance = store
    .balance(Account::Registry)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(RegistrySummary { owner, members, books, balance }))
}

// ─── Balances ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BalanceView {
  pub account: Account,
  pub balance: Amount,
}

async fn balance_of<S: LibraryStore>(store: &S, account: Account) -> Result<BalanceView, ApiError> {
  let balance = store
    .balance(account.clone())
    .await
    .map_err(ApiError::from_store)?;
  Ok(BalanceView { account, balance })
}

/// `GET /balances/registry`
pub async fn registry_balance<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<BalanceView>, ApiError>
where
  S: LibraryStore,
{
  Ok(Json(balance_of(&*store, Account::Registry).await?))
}

/// `GET /balances/:identity`
pub async fn holder_balance<S>(
  State(store): State<Arc<S>>,
  Path(identity): Path<Identity>,
) -> Result<Json<BalanceView>, ApiError>
where
  S: LibraryStore,
{
  Ok(Json(balance_of(&*store, Account::Holder(identity)).await?))
}

// ─── Deposits ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DepositBody {
  pub identity: Identity,
  pub amount:   Amount,
}

/// `POST /deposits`: the value-transfer substrate's entry point.
pub async fn deposit<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<DepositBody>,
) -> Result<Json<BalanceView>, ApiError>
where
  S: LibraryStore,
{
  let balance = store
    .deposit(body.identity.clone(), body.amount)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(BalanceView { account: Account::Holder(body.identity), balance }))
}
