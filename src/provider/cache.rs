use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Map whose values are each computed at most once
///
/// Every key gets its own slot, and the computation for a key runs while holding that slot's
/// lock: concurrent callers asking for the same key wait for the first one instead of redoing
/// its work. Only successful computations are stored.
pub(crate) struct OnceMap<T> {
    slots: Mutex<HashMap<String, Arc<Mutex<Option<T>>>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<T: Clone> OnceMap<T> {
    pub fn new() -> OnceMap<T> {
        OnceMap {
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, key: &str) -> Arc<Mutex<Option<T>>> {
        let mut slots = lock(&self.slots);
        match slots.get(key) {
            Some(slot) => slot.clone(),
            None => {
                let slot = Arc::new(Mutex::new(None));
                slots.insert(key.to_owned(), slot.clone());
                slot
            }
        }
    }

    /// Already computed value for a key
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<T> {
        let slot = lock(&self.slots).get(key).cloned()?;
        let value = lock(&slot).clone();
        value
    }

    fn is_current(&self, key: &str, slot: &Arc<Mutex<Option<T>>>) -> bool {
        lock(&self.slots)
            .get(key)
            .map_or(false, |current| Arc::ptr_eq(current, slot))
    }

    fn evict(&self, key: &str, slot: &Arc<Mutex<Option<T>>>) {
        let mut slots = lock(&self.slots);
        if slots.get(key).map_or(false, |current| Arc::ptr_eq(current, slot)) {
            slots.remove(key);
        }
    }

    /// Get the value for a key, computing it if it isn't there yet
    ///
    /// If `compute` produces nothing (or fails) the slot is dropped again and the next caller
    /// tries again, so misses never accumulate.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &str,
        compute: impl FnOnce() -> Result<Option<T>, E>,
    ) -> Result<Option<T>, E> {
        loop {
            let slot = self.slot(key);
            let mut value = lock(&slot);
            if let Some(value) = value.as_ref() {
                return Ok(Some(value.clone()));
            }

            // Evicted by a caller that came up empty while we were waiting
            if !self.is_current(key, &slot) {
                continue;
            }

            let computed = compute();
            match &computed {
                Ok(Some(computed)) => *value = Some(computed.clone()),
                Ok(None) | Err(_) => self.evict(key, &slot),
            }
            return computed;
        }
    }

    /// Number of keys with a value
    pub fn len(&self) -> usize {
        let slots: Vec<_> = lock(&self.slots).values().cloned().collect();
        slots.iter().filter(|slot| lock(slot).is_some()).count()
    }
}
