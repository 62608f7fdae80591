//! In-memory snapshot of the remote book collection
//!
//! Provides a `SnapshotCache` holding the last successfully fetched list of
//! books together with its capture time. Snapshots are immutable once taken
//! and are replaced wholesale, so readers never observe a half-written list.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use crate::data::Book;

/// An immutable copy of the remote collection
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The cached books
    pub books: Vec<Book>,
    /// When the books were fetched
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Looks up a book by id
    pub fn find(&self, id: u64) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Age of the snapshot at `now`
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.captured_at
    }
}

/// Result of reading from the cache, including metadata about freshness
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// Whether the validity window has passed
    pub is_expired: bool,
}

/// Holds the current snapshot and decides whether it can be trusted
///
/// Cloning is cheap and clones share the same snapshot. Concurrent refreshes
/// are last-writer-wins: each `replace` swaps the pointer under a short write
/// lock and never mutates a snapshot in place.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    current: Arc<RwLock<Option<Arc<Snapshot>>>>,
    validity_window: Duration,
}

impl SnapshotCache {
    /// Creates an empty cache whose snapshots stay fresh for `validity_window`
    pub fn new(validity_window: StdDuration) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            validity_window: Duration::from_std(validity_window).unwrap_or(Duration::MAX),
        }
    }

    /// The configured validity window
    pub fn validity_window(&self) -> Duration {
        self.validity_window
    }

    /// Replaces the snapshot with `books` captured now
    pub fn replace(&self, books: Vec<Book>) -> Arc<Snapshot> {
        self.replace_at(books, Utc::now())
    }

    /// Replaces the snapshot with `books` captured at `captured_at`
    pub fn replace_at(&self, books: Vec<Book>, captured_at: DateTime<Utc>) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot { books, captured_at });
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Returns the current snapshot regardless of age
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Returns true if a snapshot exists and is younger than the validity window at `now`
    ///
    /// A snapshot whose age equals the window is stale.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        self.current()
            .map(|snapshot| snapshot.age_at(now) < self.validity_window)
            .unwrap_or(false)
    }

    /// Returns the snapshot only if it is still fresh
    pub fn fresh(&self) -> Option<Arc<Snapshot>> {
        let now = Utc::now();
        self.current()
            .filter(|snapshot| snapshot.age_at(now) < self.validity_window)
    }

    /// Returns the snapshot with its freshness flag, for fallback reads
    pub fn read(&self) -> Option<CachedData<Arc<Snapshot>>> {
        let snapshot = self.current()?;
        let is_expired = snapshot.age_at(Utc::now()) >= self.validity_window;
        Some(CachedData {
            cached_at: snapshot.captured_at,
            data: snapshot,
            is_expired,
        })
    }

    /// Looks up a book in the snapshot only if the snapshot is fresh
    pub fn find_fresh(&self, id: u64) -> Option<Book> {
        self.fresh()?.find(id).cloned()
    }

    /// Looks up a book in the snapshot regardless of its age
    pub fn find_any(&self, id: u64) -> Option<CachedData<Book>> {
        let cached = self.read()?;
        let book = cached.data.find(id)?.clone();
        Some(CachedData {
            data: book,
            cached_at: cached.cached_at,
            is_expired: cached.is_expired,
        })
    }
}
