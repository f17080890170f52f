//! In-memory query cache for backend data.
//!
//! This module provides the `QueryCache`, a keyed store from a query
//! descriptor (`QueryKey`: operation name plus parameters) to the last
//! fetched value. It:
//!
//! - coalesces concurrent fetches of the same descriptor into one call
//! - serves stale entries immediately and refreshes them in the background
//! - invalidates entries by exact key or descriptor prefix
//!
//! Staleness is chosen per read (`Staleness`): the course list never goes
//! stale, per-student order lookups go stale after five minutes, everything
//! else is refreshed on every read.

pub mod entry;
pub mod key;
pub mod query;

pub use entry::CachedData;
pub use key::QueryKey;
pub use query::{CacheError, QueryCache, Staleness};
