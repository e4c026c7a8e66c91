use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tinylink_core::store::Result;
use tinylink_core::{ShortLinkRecord, StorageError, Store};

#[derive(Debug, Default)]
struct State {
    records: Vec<ShortLinkRecord>,
    saves: usize,
    failing: bool,
}

/// In-memory implementation of the [`Store`] trait.
///
/// Nothing survives the process. Clones share the same state, so a caller
/// can keep a handle to inspect what the registry flushed. Saves can be made
/// to fail on demand to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `records`, as if saved by an
    /// earlier process.
    pub fn with_records(records: Vec<ShortLinkRecord>) -> Self {
        let store = Self::new();
        store.state.lock().records = records;
        store
    }

    /// The set written by the most recent successful save.
    pub fn records(&self) -> Vec<ShortLinkRecord> {
        self.state.lock().records.clone()
    }

    /// How many saves have succeeded.
    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }

    /// Makes every following save fail with [`StorageError::Unavailable`]
    /// until switched off again.
    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load(&self) -> Result<Vec<ShortLinkRecord>> {
        Ok(self.records())
    }

    async fn save(&self, records: &[ShortLinkRecord]) -> Result<()> {
        let mut state = self.state.lock();
        if state.failing {
            return Err(StorageError::Unavailable(
                "in-memory store is set to fail".to_string(),
            ));
        }

        state.records = records.to_vec();
        state.saves += 1;
        Ok(())
    }
}
