//! Cache module for holding the book collection in memory
//!
//! This module provides a snapshot cache with a fixed validity window. Expired
//! snapshots are still returned (with `is_expired` set) so callers can fall
//! back to stale data when the API is unavailable. Nothing is persisted.

mod snapshot;

pub use snapshot::{CachedData, Snapshot, SnapshotCache};
