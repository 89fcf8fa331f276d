use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{Template, TemplateBuilder};
use crate::error::{OrmError, OrmResult};

/// Registered SQL source plus its lazily compiled template.
struct TemplateSlot {
    source: String,
    compiled: Mutex<Option<Arc<dyn Template>>>,
}

impl TemplateSlot {
    /// Compile at most once; concurrent first users wait on the slot lock.
    fn get_or_compile(&self, key: &str, builder: &dyn TemplateBuilder) -> OrmResult<Arc<dyn Template>> {
        let mut compiled = lock(&self.compiled);
        if let Some(tpl) = compiled.as_ref() {
            return Ok(Arc::clone(tpl));
        }
        let tpl = builder.build(key, &self.source)?;
        *compiled = Some(Arc::clone(&tpl));
        Ok(tpl)
    }
}

/// Key-scoped template store.
///
/// The map lock is only held for lookups and inserts; compilation happens under
/// the per-key slot lock so unrelated keys never wait on each other.
#[derive(Default)]
pub(super) struct TemplateCache {
    slots: Mutex<HashMap<String, Arc<TemplateSlot>>>,
}

impl TemplateCache {
    pub(super) fn insert_if_absent(&self, key: String, source: String) -> OrmResult<()> {
        let mut slots = lock(&self.slots);
        if slots.contains_key(&key) {
            return Err(OrmError::template(format!("the map key is repeated: {key}")));
        }
        slots.insert(
            key,
            Arc::new(TemplateSlot {
                source,
                compiled: Mutex::new(None),
            }),
        );
        Ok(())
    }

    pub(super) fn get(&self, key: &str, builder: &dyn TemplateBuilder) -> OrmResult<Arc<dyn Template>> {
        let slot = lock(&self.slots)
            .get(key)
            .cloned()
            .ok_or_else(|| OrmError::template(format!("can't match the map key: {key}")))?;
        slot.get_or_compile(key, builder)
    }

    pub(super) fn source(&self, key: &str) -> Option<String> {
        lock(&self.slots).get(key).map(|slot| slot.source.clone())
    }

    pub(super) fn contains(&self, key: &str) -> bool {
        lock(&self.slots).contains_key(key)
    }

    pub(super) fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub(super) fn is_compiled(&self, key: &str) -> bool {
        lock(&self.slots)
            .get(key)
            .is_some_and(|slot| lock(&slot.compiled).is_some())
    }
}

// Neither critical section can leave the map half-updated, so a poisoned lock is still usable.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
