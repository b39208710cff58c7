//! Handlers for the audit log: `/events` and `/books/:id/ratings`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/events` | Optional `book_id`, `kind`, `from`, `to`, `from_seq`, `to_seq`, `limit` |
//! | `POST` | `/books/:id/ratings` | Caller header; body: `{"rating":5,"comments":"..."}`; returns 201 + event |
//! | `GET`  | `/books/:id/ratings` | Count, total and mean of the book's ratings |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shelf_core::{
  book::BookId,
  event::{AuditEvent, EventQuery, EventType, Rating, RatingSummary},
  store::LibraryStore,
};

use crate::{caller::Caller, error::ApiError};

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub book_id:  Option<BookId>,
  /// `borrow`, `return` or `rating`.
  pub kind:     Option<EventType>,
  /// Inclusive lower bound on `recorded_at`.
  pub from:     Option<DateTime<Utc>>,
  /// Inclusive upper bound on `recorded_at`.
  pub to:       Option<DateTime<Utc>>,
  pub from_seq: Option<u64>,
  pub to_seq:   Option<u64>,
  pub limit:    Option<usize>,
}

impl From<ListParams> for EventQuery {
  fn from(p: ListParams) -> Self {
    EventQuery {
      book_id:  p.book_id,
      kind:     p.kind,
      from:     p.from,
      to:       p.to,
      from_seq: p.from_seq,
      to_seq:   p.to_seq,
      limit:    p.limit,
    }
  }
}

/// `GET /events[?book_id=..][&kind=..][&from=..][&to=..][&from_seq=..][&to_seq=..][&limit=..]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AuditEvent>>, ApiError>
where
  S: LibraryStore,
{
  let query = EventQuery::from(params);
  let events = store.events(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(events))
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RateBody {
  /// 1 to 5 inclusive.
  pub rating:   u8,
  #[serde(default)]
  pub comments: String,
}

/// `POST /books/:id/ratings`
pub async fn rate<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<BookId>,
  Caller(reviewer): Caller,
  Json(body): Json<RateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LibraryStore,
{
  let rating = Rating::new(body.rating)?;
  let event = store
    .rate_book(reviewer, id, rating, body.comments)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(event)))
}

/// `GET /books/:id/ratings`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<BookId>,
) -> Result<Json<RatingSummary>, ApiError>
where
  S: LibraryStore,
{
  // 404 for unknown books rather than an empty summary.
  store.get_book(id).await.map_err(ApiError::from_store)?;

  let query = EventQuery::for_book(id).of_kind(EventType::Rating);
  let ratings = store.events(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(RatingSummary::from_events(id, &ratings)))
}
