//! The `LibraryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `shelf-store-sqlite`).
//! Higher layers (`shelf-api`, `shelf-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use crate::{
  book::{Book, BookDetails, BookId, BookListing},
  error::AsDomainError,
  event::{AuditEvent, EventQuery, Rating},
  identity::Identity,
  ledger::{Account, Amount},
  member::Member,
};

/// Abstraction over a Shelf registry backend.
///
/// Implementations must serialise all mutating calls and apply each one
/// atomically: the state change, any value transfer and any audit event
/// either all commit or none do. Read calls must only ever observe
/// committed state.
///
/// Every operation that acts on behalf of someone takes that caller's
/// identity explicitly; the store does not authenticate it.
pub trait LibraryStore: Send + Sync {
  type Error: std::error::Error + AsDomainError + Send + Sync + 'static;

  // ── Registry ──────────────────────────────────────────────────────────

  /// Register `owner` as the first active member, fund the registry
  /// account with `funding`, and record `owner` as the registry owner.
  ///
  /// Fails with [`crate::Error::AlreadyInitialized`] on a second call.
  fn initialize(
    &self,
    owner_name: String,
    owner: Identity,
    funding: Amount,
  ) -> impl Future<Output = Result<Member, Self::Error>> + Send + '_;

  /// The registry owner's current member record, or `None` before
  /// initialization.
  fn owner(&self) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  // ── Members ───────────────────────────────────────────────────────────

  /// Register `identity` as an active member. A no-op if the identity is
  /// already registered, whatever its status. Returns `true` if a member
  /// was created.
  fn add_member(
    &self,
    name: String,
    identity: Identity,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Mark a member as removed. A no-op for unknown identities. Returns
  /// `true` if the identity was registered.
  fn remove_member(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Look up a member, active or removed.
  fn get_member(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<Option<Member>, Self::Error>> + Send + '_;

  /// Number of registered members, active and removed.
  fn member_count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// List a new book owned by `caller`, who must be an active member.
  /// The registry pays `caller` the listing fee.
  fn add_book(
    &self,
    caller: Identity,
    details: BookDetails,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Fetch one book; fails with [`crate::Error::NotFound`] for unknown ids.
  fn get_book(&self, id: BookId) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// Every book in ascending id order.
  fn all_books(&self) -> impl Future<Output = Result<BookListing, Self::Error>> + Send + '_;

  /// Books `caller` owns or currently has on loan, in ascending id order.
  fn my_books(
    &self,
    caller: Identity,
  ) -> impl Future<Output = Result<BookListing, Self::Error>> + Send + '_;

  /// Total number of books ever added.
  fn book_count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Lending ───────────────────────────────────────────────────────────

  /// Borrow `id` on behalf of `caller`, paying `value` from the caller's
  /// balance. Emits a borrow event.
  fn borrow_book(
    &self,
    caller: Identity,
    id: BookId,
    value: Amount,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  /// End the loan of `id`. Only the book's owner may do this. Emits a
  /// return event naming the former borrower.
  fn return_book(
    &self,
    caller: Identity,
    id: BookId,
  ) -> impl Future<Output = Result<Book, Self::Error>> + Send + '_;

  // ── Audit log ─────────────────────────────────────────────────────────

  /// Record a review of `id` by `reviewer`. Does not change the book.
  fn rate_book(
    &self,
    reviewer: Identity,
    id: BookId,
    rating: Rating,
    comments: String,
  ) -> impl Future<Output = Result<AuditEvent, Self::Error>> + Send + '_;

  /// Events matching `query`, in append order.
  fn events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<AuditEvent>, Self::Error>> + Send + 'a;

  // ── Ledger ────────────────────────────────────────────────────────────

  /// Current balance of `account`; zero for accounts never touched.
  fn balance(
    &self,
    account: Account,
  ) -> impl Future<Output = Result<Amount, Self::Error>> + Send + '_;

  /// Credit an external holder. This is the value-transfer substrate's
  /// entry point and is not audited. Returns the new balance.
  fn deposit(
    &self,
    holder: Identity,
    amount: Amount,
  ) -> impl Future<Output = Result<Amount, Self::Error>> + Send + '_;
}
