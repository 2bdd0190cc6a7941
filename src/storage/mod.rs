//! Storage layer
//!
//! Every record type lives in its own in-memory [`Collection`], keyed by id and
//! backed by a `DashMap`. [`Store`] groups the collections the application uses.

use crate::types::{RecordId, Timestamp};

pub mod collection;
pub mod store;

pub use collection::Collection;
pub use store::{SharedStore, Store, StoreStats};

/// A type that can be kept in a [`Collection`]
pub trait Record: Clone + Send + Sync + 'static {
    /// Collection name used in logs, errors and audit entries
    const COLLECTION: &'static str;

    /// Primary key
    fn id(&self) -> RecordId;

    /// Insertion order key; retention trims the oldest first
    fn created_at(&self) -> Timestamp;
}
