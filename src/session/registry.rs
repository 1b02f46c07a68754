use super::SessionHandle;
use crate::client::types::ItemId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

struct Entry {
    serial: u64,
    handle: SessionHandle,
}

/// Live conversion sessions keyed by item
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ItemId, Entry>>,
    opening: SyncMutex<HashMap<ItemId, Arc<Mutex<()>>>>,
}

/// Exclusive right to open one item; released on drop.
pub(crate) struct OpenGuard<'a> {
    registry: &'a SessionRegistry,
    item: ItemId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OpenGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let Ok(mut opening) = self.registry.opening.lock() else {
            return;
        };
        // Only the map itself still refers to the lock: nobody else is waiting.
        if opening.get(&self.item).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            opening.remove(&self.item);
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            opening: SyncMutex::new(HashMap::new()),
        }
    }

    /// The live session for `item`, if any. Dismissed sessions are not
    /// live even before their polling loop has wound down.
    pub async fn get(&self, item: &ItemId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(item)
            .map(|entry| entry.handle.clone())
            .filter(SessionHandle::is_live)
    }

    /// Serialize opens of the same item
    pub(crate) async fn lock_item(&self, item: &ItemId) -> OpenGuard<'_> {
        let lock = {
            let mut opening = self.opening.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            opening.entry(item.clone()).or_default().clone()
        };

        OpenGuard {
            registry: self,
            item: item.clone(),
            guard: Some(lock.lock_owned().await),
        }
    }

    pub(crate) async fn insert(&self, serial: u64, handle: SessionHandle) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(handle.item_id().clone(), Entry { serial, handle });
    }

    /// Drop the entry for `item` if it still belongs to session `serial`.
    pub(crate) async fn remove(&self, item: &ItemId, serial: u64) {
        let mut sessions = self.sessions.write().await;
        if sessions.get(item).is_some_and(|entry| entry.serial == serial) {
            sessions.remove(item);
        }
    }

    pub async fn active_items(&self) -> Vec<ItemId> {
        let sessions = self.sessions.read().await;
        let mut items: Vec<ItemId> = sessions
            .iter()
            .filter(|(_, entry)| entry.handle.is_live())
            .map(|(item, _)| item.clone())
            .collect();
        items.sort();
        items
    }

    /// Dismiss every live session; the CLI calls this on Ctrl-C.
    pub async fn dismiss_all(&self) {
        let sessions = self.sessions.read().await;
        for entry in sessions.values() {
            entry.handle.dismiss();
        }
    }
}
