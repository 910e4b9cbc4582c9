//! services/api/src/planner/history.rs
//!
//! The capped, persisted log of past full generations.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use travel_planner_core::domain::HistoryItem;
use travel_planner_core::ports::{DurableStorage, Persisted};

pub const HISTORY_KEY: &str = "aiTourHistory";
pub const HISTORY_CAPACITY: usize = 50;

/// Most-recent-first list of history items, saved after every mutation.
pub struct HistoryStore {
    storage: Arc<dyn DurableStorage>,
    items: Mutex<Vec<HistoryItem>>,
}

impl HistoryStore {
    /// Loads the stored history. Missing or unreadable data starts an empty history.
    pub async fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let items = match storage.load(HISTORY_KEY).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<HistoryItem>>(&json) {
                Ok(mut items) => {
                    items.truncate(HISTORY_CAPACITY);
                    info!("Loaded {} history items.", items.len());
                    items
                }
                Err(e) => {
                    warn!("Stored history is corrupt, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load history, starting empty: {}", e);
                Vec::new()
            }
        };

        Self {
            storage,
            items: Mutex::new(items),
        }
    }

    /// Prepends `item`, dropping the oldest entries beyond the cap.
    pub async fn append(&self, item: HistoryItem) -> Persisted {
        let mut items = self.items.lock().await;
        items.insert(0, item);
        items.truncate(HISTORY_CAPACITY);
        self.persist(&items).await
    }

    pub async fn list(&self) -> Vec<HistoryItem> {
        self.items.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<HistoryItem> {
        self.items.lock().await.iter().find(|item| item.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    async fn persist(&self, items: &[HistoryItem]) -> Persisted {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize history: {}", e);
                return Persisted::Degraded(e.to_string());
            }
        };
        match self.storage.save(HISTORY_KEY, &json).await {
            Ok(()) => Persisted::Saved,
            Err(e) => {
                error!("Failed to save history: {}", e);
                Persisted::Degraded(e.to_string())
            }
        }
    }
}
