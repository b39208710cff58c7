//! Integration tests for `SqliteStore` against an in-memory database.

use shelf_core::{
  Error as CoreError,
  book::{BookDetails, BookId, BookState},
  event::{EventKind, EventQuery, EventType, Rating, RatingSummary},
  fees::{DEFAULT_FEE, FeeSchedule},
  identity::Identity,
  ledger::{Account, Amount},
  member::MemberStatus,
  store::LibraryStore,
};

use chrono::TimeDelta;

use crate::{Error, SqliteStore};

const FUNDING: Amount = Amount::new(100_000_000_000_000_000);
const WALLET: Amount = Amount::new(1_000_000_000_000_000_000);

fn id(s: &str) -> Identity { Identity::parse(s).unwrap() }

fn details(title: &str, author: &str) -> BookDetails {
  BookDetails {
    title:       title.into(),
    author:      author.into(),
    publisher:   "Secker & Warburg".into(),
    image_url:   "https://covers.example/1984.jpg".into(),
    description: "Big Brother is watching you".into(),
    genre:       "Dystopian".into(),
  }
}

async fn bare_store() -> SqliteStore {
  SqliteStore::open_in_memory(FeeSchedule::default())
    .await
    .expect("in-memory store")
}

/// An initialized registry owned by `lallan`.
async fn store() -> SqliteStore {
  let s = bare_store().await;
  s.initialize("Lallan".into(), id("lallan"), FUNDING).await.unwrap();
  s
}

/// Register `who` and give them something to spend on borrowing.
async fn funded_member(s: &SqliteStore, name: &str, who: &str) -> Identity {
  let who = id(who);
  s.add_member(name.into(), who.clone()).await.unwrap();
  s.deposit(who.clone(), WALLET).await.unwrap();
  who
}

fn core_err(err: Error) -> CoreError {
  match err {
    Error::Core(e) => e,
    other => panic!("expected a registry rejection, got {other}"),
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_registers_owner_and_funds_registry() {
  let s = store().await;

  assert_eq!(s.member_count().await.unwrap(), 1);
  assert_eq!(s.book_count().await.unwrap(), 0);
  assert_eq!(s.balance(Account::Registry).await.unwrap(), FUNDING);

  let owner = s.owner().await.unwrap().expect("owner after initialize");
  assert_eq!(owner.identity, id("lallan"));
  assert_eq!(owner.name, "Lallan");
  assert!(owner.is_active());
}

#[tokio::test]
async fn initialize_twice_is_rejected() {
  let s = store().await;
  let err = s.initialize("Other".into(), id("other"), Amount::ZERO).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::AlreadyInitialized);
  assert_eq!(s.member_count().await.unwrap(), 1);
}

#[tokio::test]
async fn operations_before_initialize_are_rejected() {
  let s = bare_store().await;
  assert!(s.owner().await.unwrap().is_none());

  let err = s.add_member("Ann".into(), id("ann")).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::NotInitialized);

  let err = s.deposit(id("ann"), WALLET).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::NotInitialized);
}

// ─── Members ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_member_is_idempotent() {
  let s = store().await;

  assert!(s.add_member("John".into(), id("john")).await.unwrap());
  assert!(!s.add_member("Johnny".into(), id("john")).await.unwrap());
  assert!(!s.add_member("Lallan again".into(), id("lallan")).await.unwrap());

  assert_eq!(s.member_count().await.unwrap(), 2);
  let john = s.get_member(id("john")).await.unwrap().unwrap();
  assert_eq!(john.name, "John");
}

#[tokio::test]
async fn removed_member_stays_removed_on_re_add() {
  let s = store().await;
  s.add_member("John".into(), id("john")).await.unwrap();

  assert!(s.remove_member(id("john")).await.unwrap());
  assert!(!s.add_member("John".into(), id("john")).await.unwrap());

  let john = s.get_member(id("john")).await.unwrap().unwrap();
  assert_eq!(john.status, MemberStatus::Removed);
  assert_eq!(s.member_count().await.unwrap(), 2);
}

#[tokio::test]
async fn remove_unknown_member_is_noop() {
  let s = store().await;
  assert!(!s.remove_member(id("ghost")).await.unwrap());
  assert!(s.get_member(id("ghost")).await.unwrap().is_none());
}

#[tokio::test]
async fn removed_owner_cannot_add_books() {
  let s = store().await;
  s.deposit(id("lallan"), WALLET).await.unwrap();
  s.remove_member(id("lallan")).await.unwrap();

  let err = s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));
  assert_eq!(s.book_count().await.unwrap(), 0);
  assert_eq!(s.balance(Account::Registry).await.unwrap(), FUNDING);
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_member_cannot_add_books() {
  let s = store().await;
  s.deposit(id("stranger"), WALLET).await.unwrap();

  let err = s.add_book(id("stranger"), details("1984", "Orwell")).await.unwrap_err();
  assert_eq!(
    core_err(err),
    CoreError::Unauthorized { caller: id("stranger"), action: "add a book" }
  );
  assert_eq!(s.book_count().await.unwrap(), 0);
}

#[tokio::test]
async fn add_book_assigns_sequential_ids_and_pays_listing_fee() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;

  let first = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  let second = s.add_book(john.clone(), details("Animal Farm", "Orwell")).await.unwrap();

  assert_eq!(first.id, BookId::FIRST);
  assert_eq!(second.id, BookId::FIRST.next());
  assert_eq!(first.state, BookState::Available);
  assert_eq!(first.borrower, None);
  assert_eq!(first.borrowed_at, None);
  assert_eq!(first.owner, john);

  let listing = DEFAULT_FEE.checked_add(DEFAULT_FEE).unwrap();
  assert_eq!(
    s.balance(Account::Holder(john)).await.unwrap(),
    WALLET.checked_add(listing).unwrap()
  );
  assert_eq!(
    s.balance(Account::Registry).await.unwrap(),
    FUNDING.checked_sub(listing).unwrap()
  );
}

#[tokio::test]
async fn owner_lists_first_book_on_fresh_registry() {
  let s = store().await;

  let book = s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap();

  assert_eq!(book.id, BookId::FIRST);
  assert_eq!(
    s.balance(Account::Registry).await.unwrap(),
    FUNDING.checked_sub(DEFAULT_FEE).unwrap()
  );
  assert_eq!(s.balance(Account::Holder(id("lallan"))).await.unwrap(), DEFAULT_FEE);
}

#[tokio::test]
async fn unfunded_registry_cannot_pay_listing_fee() {
  let s = bare_store().await;
  s.initialize("Lallan".into(), id("lallan"), Amount::ZERO).await.unwrap();

  let err = s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap_err();
  assert_eq!(
    core_err(err),
    CoreError::InsufficientFunds {
      account:  Account::Registry,
      balance:  Amount::ZERO,
      required: DEFAULT_FEE,
    }
  );
  assert_eq!(s.book_count().await.unwrap(), 0);
  assert_eq!(s.balance(Account::Holder(id("lallan"))).await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn free_listing_needs_no_balance() {
  let fees = FeeSchedule { listing_fee: Amount::ZERO, ..FeeSchedule::default() };
  let s = SqliteStore::open_in_memory(fees).await.unwrap();
  s.initialize("Lallan".into(), id("lallan"), Amount::ZERO).await.unwrap();

  let book = s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap();
  assert_eq!(book.id, BookId::FIRST);
  assert_eq!(s.balance(Account::Registry).await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn get_unknown_book_is_not_found() {
  let s = store().await;
  let err = s.get_book(BookId::new(42)).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::NotFound(BookId::new(42)));
}

#[tokio::test]
async fn my_books_lists_owned_and_borrowed() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;

  let johns = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  let marys = s.add_book(mary.clone(), details("Emma", "Austen")).await.unwrap();
  s.add_book(mary.clone(), details("Persuasion", "Austen")).await.unwrap();
  s.borrow_book(john.clone(), marys.id, DEFAULT_FEE).await.unwrap();

  let mine = s.my_books(john.clone()).await.unwrap();
  let ids: Vec<_> = mine.books.iter().map(|b| b.id).collect();
  assert_eq!(ids, vec![johns.id, marys.id]);
  assert_eq!(mine.count, 2);

  let all = s.all_books().await.unwrap();
  assert_eq!(all.count, 3);
  assert!(all.books.windows(2).all(|w| w[0].id < w[1].id));

  assert_eq!(s.my_books(id("nobody")).await.unwrap().count, 0);
}

// ─── Lending ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn borrow_and_return_round_trip() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;

  let added = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let borrowed = s.borrow_book(mary.clone(), added.id, DEFAULT_FEE).await.unwrap();
  assert_eq!(borrowed.state, BookState::Borrowed);
  assert_eq!(borrowed.borrower.as_ref(), Some(&mary));
  assert!(borrowed.borrowed_at.is_some());
  assert_eq!(s.get_book(added.id).await.unwrap(), borrowed);

  let returned = s.return_book(john.clone(), added.id).await.unwrap();
  assert_eq!(returned, added);
  assert_eq!(s.get_book(added.id).await.unwrap(), added);

  let events = s.events(&EventQuery::for_book(added.id)).await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].kind, EventKind::Borrow { borrower: mary.clone() });
  assert_eq!(events[1].kind, EventKind::Return { borrower: mary });
  assert!(events[0].seq < events[1].seq);
  assert!(events[0].recorded_at <= events[1].recorded_at);
}

#[tokio::test]
async fn borrow_splits_value_between_owner_and_registry() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let john_before = s.balance(Account::Holder(john.clone())).await.unwrap();
  let registry_before = s.balance(Account::Registry).await.unwrap();

  let value = Amount::new(100_000_000_000_000_001);
  s.borrow_book(mary.clone(), book.id, value).await.unwrap();

  let owner_share = Amount::new(50_000_000_000_000_000);
  let registry_share = Amount::new(50_000_000_000_000_001);
  assert_eq!(
    s.balance(Account::Holder(john)).await.unwrap(),
    john_before.checked_add(owner_share).unwrap()
  );
  assert_eq!(
    s.balance(Account::Registry).await.unwrap(),
    registry_before.checked_add(registry_share).unwrap()
  );
  assert_eq!(
    s.balance(Account::Holder(mary)).await.unwrap(),
    WALLET.checked_sub(value).unwrap()
  );
}

#[tokio::test]
async fn borrow_below_minimum_is_rejected() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let err = s.borrow_book(john, book.id, Amount::new(10_000)).await.unwrap_err();
  assert_eq!(
    core_err(err),
    CoreError::InsufficientValue { attached: Amount::new(10_000), minimum: DEFAULT_FEE }
  );
  assert!(s.get_book(book.id).await.unwrap().is_available());
}

#[tokio::test]
async fn owner_may_borrow_own_book() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let wallet_before = s.balance(Account::Holder(john.clone())).await.unwrap();
  let registry_before = s.balance(Account::Registry).await.unwrap();

  let value = Amount::new(3_000_000_000_001);
  let borrowed = s.borrow_book(john.clone(), book.id, value).await.unwrap();
  assert_eq!(borrowed.borrower, Some(john.clone()));

  // Pays the full value and gets the owner half back.
  let (owner_share, registry_share) = value.halve();
  assert_eq!(
    s.balance(Account::Holder(john.clone())).await.unwrap(),
    wallet_before.checked_sub(value).unwrap().checked_add(owner_share).unwrap()
  );
  assert_eq!(
    s.balance(Account::Registry).await.unwrap(),
    registry_before.checked_add(registry_share).unwrap()
  );

  let mine = s.my_books(john).await.unwrap();
  assert_eq!(mine.count, 1);
  assert_eq!(mine.books, vec![borrowed]);
}

#[tokio::test]
async fn borrowing_a_borrowed_book_is_rejected() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  s.borrow_book(mary.clone(), book.id, DEFAULT_FEE).await.unwrap();

  let before = s.balance(Account::Holder(john.clone())).await.unwrap();
  let err = s.borrow_book(john.clone(), book.id, DEFAULT_FEE).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::AlreadyBorrowed(book.id));

  assert_eq!(s.balance(Account::Holder(john)).await.unwrap(), before);
  assert_eq!(s.get_book(book.id).await.unwrap().borrower, Some(mary));
}

#[tokio::test]
async fn borrowing_unknown_book_is_not_found() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let err = s.borrow_book(john, BookId::new(7), DEFAULT_FEE).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::NotFound(BookId::new(7)));
}

#[tokio::test]
async fn failed_payment_leaves_everything_untouched() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  s.deposit(id("poor"), Amount::new(5)).await.unwrap();

  let registry_before = s.balance(Account::Registry).await.unwrap();
  let john_before = s.balance(Account::Holder(john.clone())).await.unwrap();

  let err = s.borrow_book(id("poor"), book.id, DEFAULT_FEE).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::InsufficientFunds { .. }));

  assert_eq!(s.get_book(book.id).await.unwrap(), book);
  assert!(s.events(&EventQuery::default()).await.unwrap().is_empty());
  assert_eq!(s.balance(Account::Registry).await.unwrap(), registry_before);
  assert_eq!(s.balance(Account::Holder(john)).await.unwrap(), john_before);
  assert_eq!(s.balance(Account::Holder(id("poor"))).await.unwrap(), Amount::new(5));
}

#[tokio::test]
async fn only_owner_may_return() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  s.borrow_book(mary.clone(), book.id, DEFAULT_FEE).await.unwrap();

  let err = s.return_book(mary.clone(), book.id).await.unwrap_err();
  assert!(matches!(core_err(err), CoreError::Unauthorized { .. }));
  assert_eq!(s.get_book(book.id).await.unwrap().state, BookState::Borrowed);
}

#[tokio::test]
async fn returning_available_book_is_rejected() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let err = s.return_book(john, book.id).await.unwrap_err();
  assert_eq!(core_err(err), CoreError::NotBorrowed(book.id));
  assert!(s.events(&EventQuery::default()).await.unwrap().is_empty());
}

// ─── Ratings and the audit log ───────────────────────────────────────────────

#[tokio::test]
async fn ratings_are_logged_without_changing_the_book() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();

  let event = s
    .rate_book(id("visitor"), book.id, Rating::new(5).unwrap(), "Chilling".into())
    .await
    .unwrap();
  assert_eq!(event.book_id, book.id);
  assert_eq!(
    event.kind,
    EventKind::Rating {
      reviewer: id("visitor"),
      rating:   Rating::new(5).unwrap(),
      comments: "Chilling".into(),
    }
  );
  assert_eq!(s.get_book(book.id).await.unwrap(), book);

  let stored = s.events(&EventQuery::default()).await.unwrap();
  assert_eq!(stored, vec![event]);
}

#[tokio::test]
async fn rating_unknown_book_is_not_found() {
  let s = store().await;
  let err = s
    .rate_book(id("visitor"), BookId::new(3), Rating::new(4).unwrap(), String::new())
    .await
    .unwrap_err();
  assert_eq!(core_err(err), CoreError::NotFound(BookId::new(3)));
}

#[test]
fn out_of_range_rating_never_reaches_the_store() {
  assert_eq!(Rating::new(0), Err(CoreError::InvalidRating(0)));
  assert_eq!(Rating::new(6), Err(CoreError::InvalidRating(6)));
}

#[tokio::test]
async fn events_filter_by_book_kind_seq_and_limit() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let mary = funded_member(&s, "Mary", "mary").await;
  let a = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  let b = s.add_book(john.clone(), details("Animal Farm", "Orwell")).await.unwrap();

  s.borrow_book(mary.clone(), a.id, DEFAULT_FEE).await.unwrap();
  s.rate_book(mary.clone(), a.id, Rating::new(4).unwrap(), "Good".into()).await.unwrap();
  s.rate_book(mary.clone(), b.id, Rating::new(2).unwrap(), "Meh".into()).await.unwrap();
  s.return_book(john.clone(), a.id).await.unwrap();
  s.rate_book(john.clone(), a.id, Rating::new(5).unwrap(), "Mine".into()).await.unwrap();

  let all = s.events(&EventQuery::default()).await.unwrap();
  assert_eq!(all.len(), 5);
  assert!(all.windows(2).all(|w| w[0].seq < w[1].seq));

  let for_a = s.events(&EventQuery::for_book(a.id)).await.unwrap();
  assert_eq!(for_a.len(), 4);
  assert!(for_a.iter().all(|e| e.book_id == a.id));

  let ratings_for_a =
    s.events(&EventQuery::for_book(a.id).of_kind(EventType::Rating)).await.unwrap();
  assert_eq!(ratings_for_a.len(), 2);

  let summary = RatingSummary::from_events(a.id, &ratings_for_a);
  assert_eq!(summary.count, 2);
  assert_eq!(summary.total, 9);
  assert_eq!(summary.average, Some(4.5));

  let tail = EventQuery { from_seq: Some(all[2].seq), ..EventQuery::default() };
  let tail = s.events(&tail).await.unwrap();
  assert_eq!(tail, all[2..].to_vec());

  let head = EventQuery { to_seq: Some(all[1].seq), ..EventQuery::default() };
  assert_eq!(s.events(&head).await.unwrap(), all[..2].to_vec());

  let limited = EventQuery { limit: Some(3), ..EventQuery::default() };
  assert_eq!(s.events(&limited).await.unwrap(), all[..3].to_vec());

  let window = EventQuery::default().between(all[0].recorded_at, all[4].recorded_at);
  assert_eq!(s.events(&window).await.unwrap(), all);

  let returns = s.events(&EventQuery::default().of_kind(EventType::Return)).await.unwrap();
  assert_eq!(returns.len(), 1);
  assert_eq!(returns[0].kind, EventKind::Return { borrower: mary });
}

#[tokio::test]
async fn non_matching_event_queries_are_empty() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  s.borrow_book(john.clone(), book.id, DEFAULT_FEE).await.unwrap();
  s.return_book(john.clone(), book.id).await.unwrap();

  let all = s.events(&EventQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  let first = all[0].recorded_at;
  let last = all[1].recorded_at;
  let second = TimeDelta::seconds(1);

  let queries = [
    EventQuery::default().between(first - second * 2, first - second),
    EventQuery::default().between(last, first - second),
    EventQuery::for_book(BookId::new(99)),
    EventQuery::default().of_kind(EventType::Rating),
    EventQuery { from_seq: Some(all[1].seq + 1), ..EventQuery::default() },
    EventQuery { limit: Some(0), ..EventQuery::default() },
  ];
  for query in &queries {
    assert!(s.events(query).await.unwrap().is_empty(), "{query:?}");
  }
}

#[tokio::test]
async fn sub_microsecond_lower_bound_excludes_earlier_events() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  s.borrow_book(john.clone(), book.id, DEFAULT_FEE).await.unwrap();

  let all = s.events(&EventQuery::default()).await.unwrap();
  let query = EventQuery {
    from: Some(all[0].recorded_at + TimeDelta::nanoseconds(500)),
    ..EventQuery::default()
  };

  let found = s.events(&query).await.unwrap();
  assert!(found.is_empty());
  assert!(all.iter().all(|e| !query.matches(e)));
}

#[tokio::test]
async fn subscribers_see_committed_events_only() {
  let s = store().await;
  let john = funded_member(&s, "John", "john").await;
  let book = s.add_book(john.clone(), details("1984", "Orwell")).await.unwrap();
  let mut feed = s.subscribe();

  // Rejected: nothing is published.
  s.return_book(john.clone(), book.id).await.unwrap_err();

  s.borrow_book(john.clone(), book.id, DEFAULT_FEE).await.unwrap();
  let published = feed.recv().await.unwrap();
  assert_eq!(published.kind.event_type(), EventType::Borrow);

  let logged = s.events(&EventQuery::default()).await.unwrap();
  assert_eq!(logged, vec![published]);
  assert!(feed.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_ratings_reach_subscribers_in_seq_order() {
  let s = store().await;
  let book = s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap();
  let mut feed = s.subscribe();

  let tasks: Vec<_> = (0..16)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.rate_book(id("visitor"), book.id, Rating::new(i % 5 + 1).unwrap(), String::new())
          .await
          .unwrap()
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  let mut seqs = Vec::new();
  while let Ok(event) = feed.try_recv() {
    seqs.push(event.seq);
  }
  assert_eq!(seqs.len(), 16);
  assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{seqs:?}");
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn untouched_accounts_have_zero_balance() {
  let s = store().await;
  assert_eq!(s.balance(Account::Holder(id("nobody"))).await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn deposits_accumulate() {
  let s = store().await;
  assert_eq!(s.deposit(id("ann"), Amount::new(3)).await.unwrap(), Amount::new(3));
  assert_eq!(s.deposit(id("ann"), Amount::new(4)).await.unwrap(), Amount::new(7));
}

#[tokio::test]
async fn state_survives_reopening_the_file() {
  let dir = std::env::temp_dir().join(format!("shelf-store-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("shelf.db");

  {
    let s = SqliteStore::open(&path, FeeSchedule::default()).await.unwrap();
    s.initialize("Lallan".into(), id("lallan"), FUNDING).await.unwrap();
    s.deposit(id("lallan"), WALLET).await.unwrap();
    s.add_book(id("lallan"), details("1984", "Orwell")).await.unwrap();
  }

  let s = SqliteStore::open(&path, FeeSchedule::default()).await.unwrap();
  assert_eq!(s.book_count().await.unwrap(), 1);
  assert!(matches!(
    s.initialize("X".into(), id("x"), Amount::ZERO).await,
    Err(Error::Core(CoreError::AlreadyInitialized))
  ));
  let next = s.add_book(id("lallan"), details("Animal Farm", "Orwell")).await.unwrap();
  assert_eq!(next.id, BookId::new(2));

  std::fs::remove_dir_all(dir).ok();
}
