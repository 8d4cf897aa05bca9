//! Per-class caches.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use ormschema_core::{ModelKey, ModelRef, Result};

/// Values computed once per model class and kept for the process lifetime.
///
/// Entries hold on to their `ModelRef`, so a key's address can never be
/// reused by another class while the entry exists. Two threads may compute
/// the same entry concurrently; the first insert wins.
pub(crate) struct ClassCache<T> {
    entries: RwLock<HashMap<ModelKey, (ModelRef, Arc<T>)>>,
}

impl<T> ClassCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_try_insert_with(
        &self,
        model: &ModelRef,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<Arc<T>> {
        let key = ModelKey::of(model);

        // Fast path: already cached
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((_, value)) = entries.get(&key) {
                return Ok(Arc::clone(value));
            }
        }

        // Slow path: compute without holding the lock, then insert
        let value = Arc::new(f()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let (_, value) = entries
            .entry(key)
            .or_insert_with(|| (ModelRef::clone(model), value));
        Ok(Arc::clone(value))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
