//! Handlers for `/books` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/books` | Optional `?format=json\|legacy` |
//! | `POST` | `/books` | Caller header; body: [`BookDetails`]; returns 201 + stored book |
//! | `GET`  | `/books/mine` | Caller header; books the caller owns or borrows |
//! | `GET`  | `/books/:id` | 404 if not found |
//! | `POST` | `/books/:id/borrow` | Caller header; body: `{"value":1000000000000}` |
//! | `POST` | `/books/:id/return` | Caller header; owner only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use shelf_core::{
  book::{Book, BookDetails, BookId, BookListing},
  ledger::Amount,
  store::LibraryStore,
};

use crate::{caller::Caller, error::ApiError};

// ─── Representation ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
  #[default]
  Json,
  /// `;`/`|` delimited records, served as `text/plain`.
  Legacy,
}

#[derive(Debug, Default, Deserialize)]
pub struct FormatParams {
  #[serde(default)]
  pub format: Format,
}

fn render_listing(listing: BookListing, format: Format) -> Result<Response, ApiError> {
  Ok(match format {
    Format::Json => Json(listing).into_response(),
    Format::Legacy => shelf_legacy::encode_books(&listing.books)?.into_response(),
  })
}

fn render_book(book: Book, format: Format) -> Result<Response, ApiError> {
  Ok(match format {
    Format::Json => Json(book).into_response(),
    Format::Legacy => shelf_legacy::encode_book(&book)?.into_response(),
  })
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// `GET /books[?format=legacy]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<FormatParams>,
) -> Result<Response, ApiError>
where
  S: LibraryStore,
{
  let listing = store.all_books().await.map_err(ApiError::from_store)?;
  render_listing(listing, params.format)
}

/// `GET /books/mine[?format=legacy]`
pub async fn mine<S>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<FormatParams>,
) -> Result<Response, ApiError>
where
  S: LibraryStore,
{
  let listing = store.my_books(caller).await.map_err(ApiError::from_store)?;
  render_listing(listing, params.format)
}

/// `GET /books/:id[?format=legacy]`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<BookId>,
  Query(params): Query<FormatParams>,
) -> Result<Response, ApiError>
where
  S: LibraryStore,
{
  let book = store.get_book(id).await.map_err(ApiError::from_store)?;
  render_book(book, params.format)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /books`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Json(details): Json<BookDetails>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LibraryStore,
{
  let book = store
    .add_book(caller, details)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(book)))
}

// ─── Lending ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BorrowBody {
  /// Value attached to the borrow, in the smallest unit.
  pub value: Amount,
}

/// `POST /books/:id/borrow`
pub async fn borrow<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<BookId>,
  Caller(caller): Caller,
  Json(body): Json<BorrowBody>,
) -> Result<Json<Book>, ApiError>
where
  S: LibraryStore,
{
  let book = store
    .borrow_book(caller, id, body.value)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(book))
}

/// `POST /books/:id/return`
pub async fn return_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<BookId>,
  Caller(caller): Caller,
) -> Result<Json<Book>, ApiError>
where
  S: LibraryStore,
{
  let book = store
    .return_book(caller, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(book))
}
