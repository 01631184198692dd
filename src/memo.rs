use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use once_cell::sync::OnceCell;

/// Process-lifetime memo keyed by call arguments.
///
/// Each key owns a `OnceCell`, so concurrent callers for the same key wait on
/// the single in-flight initialization instead of fetching twice. Failed
/// initializations leave the cell empty and the next caller retries.
pub struct Memo<K, V> {
    slots: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_try_init<E>(
        &self,
        key: &K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let slot = {
            let mut slots = self.lock();
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        slot.get_or_try_init(|| init().map(Arc::new)).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().get(key).is_some_and(|slot| slot.get().is_some())
    }

    /// Drops every stored entry. Initializations already running finish but
    /// their results are no longer reachable through this memo.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<OnceCell<Arc<V>>>>> {
        // A panic inside an initializer never holds this lock.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}
