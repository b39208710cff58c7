//! Core types and trait definitions for the Shelf lending registry.
//!
//! This crate holds the member registry model, the book lending state
//! machine, the fee split, and the audit event model. It performs no I/O;
//! storage backends implement [`store::LibraryStore`] on top of it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod book;
pub mod error;
pub mod event;
pub mod fees;
pub mod identity;
pub mod ledger;
pub mod member;
pub mod store;

pub use error::{Error, Result};
