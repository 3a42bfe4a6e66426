//! Process-wide sharing of conversion engines.
//!
//! Filters configured with the same `opencc_config` string share one
//! [`Opencc`]. The registry only holds weak handles, so an engine is freed
//! once its last filter goes away; the engine then removes its own entry.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use ahash::AHashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::opencc::Opencc;

type Entries = Arc<Mutex<AHashMap<String, Weak<Opencc>>>>;

static GLOBAL: Lazy<OpenccRegistry> = Lazy::new(OpenccRegistry::new);

fn lock(entries: &Entries) -> MutexGuard<'_, AHashMap<String, Weak<Opencc>>> {
    entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Removes a registry entry when the engine it points to is dropped.
pub(crate) struct ReleaseHook {
    entries: Entries,
    key: String,
}

impl ReleaseHook {
    pub(crate) fn release(self) {
        let mut entries = lock(&self.entries);
        // A newer engine may have taken the key in the meantime.
        if entries
            .get(&self.key)
            .is_some_and(|weak| weak.strong_count() == 0)
        {
            entries.remove(&self.key);
            debug!("released opencc engine {}", self.key);
        }
    }
}

#[derive(Clone, Default)]
pub struct OpenccRegistry {
    entries: Entries,
}

impl OpenccRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by all filters in the process.
    pub fn global() -> &'static OpenccRegistry {
        &GLOBAL
    }

    /// The live engine registered under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<Opencc>> {
        lock(&self.entries).get(key)?.upgrade()
    }

    /// The live engine under `key`, or a new one for `config_path`.
    pub fn get_or_create<P: Into<PathBuf>>(&self, key: &str, config_path: P) -> Arc<Opencc> {
        let mut entries = lock(&self.entries);
        if let Some(opencc) = entries.get(key).and_then(Weak::upgrade) {
            return opencc;
        }
        let opencc = Arc::new(Opencc::new(config_path).with_release(ReleaseHook {
            entries: Arc::clone(&self.entries),
            key: key.to_string(),
        }));
        entries.insert(key.to_string(), Arc::downgrade(&opencc));
        debug!("registered opencc engine {}", key);
        opencc
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.entries).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
