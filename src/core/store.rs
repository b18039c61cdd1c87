use crate::domain::model::InventorySnapshot;
use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct StoreState {
    current: Arc<InventorySnapshot>,
    last_sync: Option<DateTime<Utc>>,
}

/// Single source of truth for the carrier inventory.
///
/// Writers swap the whole snapshot; readers clone the `Arc` under a short
/// shared lock and never see a half-written value.
#[derive(Debug, Default)]
pub struct InventoryStore {
    state: RwLock<StoreState>,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Arc<InventorySnapshot> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.current)
    }

    pub fn replace(&self, snapshot: InventorySnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.current = snapshot;
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_sync
    }

    pub fn mark_synced(&self, at: DateTime<Utc>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.last_sync = Some(at);
    }
}
