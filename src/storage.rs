//! Key-value persistence for tracker state.

use crate::error::Error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Sentinel stored under [`keys::METRICS_OPT_IN`] when the user opts in.
pub const AGREED: &str = "agreed";

/// Sentinel stored under [`keys::METRICS_OPT_IN`] when the user opts out.
pub const DENIED: &str = "denied";

/// Storage keys owned by the tracker.
pub mod keys {
    /// Consent flag, one of [`AGREED`](super::AGREED)/[`DENIED`](super::DENIED).
    pub const METRICS_OPT_IN: &str = "metrics-opt-in";

    /// Current-namespace tracking identifier, a UUIDv4 string.
    pub const METAMETRICS_ID: &str = "metametrics-id";

    /// Legacy-namespace identifier. Read-only migration source.
    pub const LEGACY_METAMETRICS_ID: &str = "mixpanel-metametrics-id";

    /// Deletion regulation ID, absent when no request is outstanding.
    pub const DELETE_REGULATION_ID: &str = "metametrics-delete-regulation-id";

    /// Deletion request creation date, `D/M/YYYY`.
    pub const DELETE_REGULATION_DATE: &str = "analytics-data-deletion-date";

    /// Whether any event has been recorded since the last deletion request.
    pub const DATA_RECORDED: &str = "analytics-data-recorded";
}

/// Durable string key-value store backing the tracker state.
///
/// Implementations map onto whatever the host platform provides for small
/// preference-style values. All failures surface as [`Error::Storage`]; the
/// tracker treats them as soft errors.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    async fn set(&self, key: &str, value: &str) -> Result<(), Error>;

    async fn remove(&self, key: &str) -> Result<(), Error>;
}

/// In-memory [`Storage`] backed by a `BTreeMap`.
///
/// Fully functional and cheap to clone (clones share the underlying map),
/// suitable for tests and lightweight embedders.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    data: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.data.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.data.lock().remove(key);
        Ok(())
    }
}
