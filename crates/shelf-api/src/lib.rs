//! JSON REST API for Shelf.
//!
//! Exposes an axum [`Router`] backed by any [`shelf_core::store::LibraryStore`].
//! Requests that act on behalf of someone name them in the
//! [`caller::CALLER_HEADER`] header. Authenticating that header, TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", shelf_api::api_router(store.clone()))
//! ```

pub mod books;
pub mod caller;
pub mod error;
pub mod events;
pub mod members;
pub mod registry;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use shelf_core::store::LibraryStore;

pub use caller::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: LibraryStore + 'static,
{
  Router::new()
    // Registry and ledger
    .route("/registry", get(registry::summary::<S>))
    .route("/balances/registry", get(registry::registry_balance::<S>))
    .route("/balances/{identity}", get(registry::holder_balance::<S>))
    .route("/deposits", post(registry::deposit::<S>))
    // Members
    .route("/members", post(members::create::<S>))
    .route(
      "/members/{identity}",
      get(members::get_one::<S>).delete(members::remove::<S>),
    )
    // Books
    .route("/books", get(books::list::<S>).post(books::create::<S>))
    .route("/books/mine", get(books::mine::<S>))
    .route("/books/{id}", get(books::get_one::<S>))
    .route("/books/{id}/borrow", post(books::borrow::<S>))
    .route("/books/{id}/return", post(books::return_one::<S>))
    // Audit log
    .route(
      "/books/{id}/ratings",
      get(events::summary::<S>).post(events::rate::<S>),
    )
    .route("/events", get(events::list::<S>))
    .with_state(store)
}
