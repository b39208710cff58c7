//! Handlers for `/members` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/members` | Body: `{"name":"John","identity":"john"}`; 201 if created, 200 if already registered |
//! | `GET`    | `/members/:identity` | 404 if never registered |
//! | `DELETE` | `/members/:identity` | 204; no-op for unknown identities |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use shelf_core::{identity::Identity, member::Member, store::LibraryStore};

use crate::error::ApiError;

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:     String,
  pub identity: Identity,
}

/// `POST /members`
///
/// Responds with the stored member either way. An existing identity keeps
/// its original name and status.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LibraryStore,
{
  let created = store
    .add_member(body.name, body.identity.clone())
    .await
    .map_err(ApiError::from_store)?;

  let member = fetch(&*store, body.identity).await?;
  let status = if created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(member)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /members/:identity`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(identity): Path<Identity>,
) -> Result<Json<Member>, ApiError>
where
  S: LibraryStore,
{
  Ok(Json(fetch(&*store, identity).await?))
}

// ─── Remove ──────────────────────────────────────────────────────────────────

/// `DELETE /members/:identity`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  Path(identity): Path<Identity>,
) -> Result<StatusCode, ApiError>
where
  S: LibraryStore,
{
  store
    .remove_member(identity)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn fetch<S: LibraryStore>(store: &S, identity: Identity) -> Result<Member, ApiError> {
  store
    .get_member(identity.clone())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("member {identity} not found")))
}
