//! The conversion engine.
//!
//! An `Opencc` wraps one configuration file. The file is parsed on first use
//! and the engine is shared between every filter configured with the same
//! file (see [`crate::registry`]). A failed load leaves the engine unready and
//! the next call tries again; while unready every conversion reports that
//! nothing was converted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, warn};

use crate::config::ConverterConfig;
use crate::converter::Converter;
use crate::error::{OpenccError, Result};
use crate::registry::ReleaseHook;

pub struct Opencc {
    config_path: PathBuf,
    ready: AtomicBool,
    init_lock: Mutex<()>,
    converter: OnceLock<Converter>,
    rng: Mutex<StdRng>,
    release: Option<ReleaseHook>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Opencc {
    /// Create an engine for `config_path`. Nothing is loaded yet.
    pub fn new<P: Into<PathBuf>>(config_path: P) -> Self {
        Self::with_rng(config_path.into(), StdRng::from_entropy())
    }

    /// Like `new`, with a deterministic random source.
    pub fn with_seed<P: Into<PathBuf>>(config_path: P, seed: u64) -> Self {
        Self::with_rng(config_path.into(), StdRng::seed_from_u64(seed))
    }

    fn with_rng(config_path: PathBuf, rng: StdRng) -> Self {
        Self {
            config_path,
            ready: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            converter: OnceLock::new(),
            rng: Mutex::new(rng),
            release: None,
        }
    }

    pub(crate) fn with_release(mut self, hook: ReleaseHook) -> Self {
        self.release = Some(hook);
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Load the configuration if that has not succeeded yet. Returns whether
    /// the engine is ready.
    pub fn initialize(&self) -> bool {
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        let _guard = lock(&self.init_lock);
        if self.ready.load(Ordering::Acquire) {
            return true;
        }
        match self.load() {
            Ok(()) => {
                self.ready.store(true, Ordering::Release);
                true
            }
            Err(e) => {
                error!(
                    "opencc initialization failed: {}, path: {}",
                    e,
                    self.config_path.display()
                );
                false
            }
        }
    }

    fn load(&self) -> Result<()> {
        if self.converter.get().is_none() {
            let converter = ConverterConfig::load(&self.config_path)?;
            if converter.conversion_chain().is_empty() {
                return Err(OpenccError::EmptyChain);
            }
            // Only reachable under `init_lock`, so the cell is still empty.
            let _ = self.converter.set(converter);
        }
        Ok(())
    }

    fn converter(&self) -> Option<&Converter> {
        if !self.initialize() {
            warn!("opencc not ready, skipping conversion");
            return None;
        }
        self.converter.get()
    }

    /// All forms `text` may take after the whole chain.
    ///
    /// Each stage maps every word of the working set either to all values of
    /// an exact match, or to its default max-match conversion (kept even when
    /// unchanged, since a later stage may still diverge on it). Succeeds only
    /// if some stage matched a word exactly.
    pub fn convert_word(&self, text: &str) -> Option<Vec<String>> {
        if text.is_empty() {
            return None;
        }
        let converter = self.converter()?;
        let mut words = vec![text.to_string()];
        let mut matched = false;
        for conversion in converter.conversion_chain().conversions() {
            let mut seen: AHashSet<String> = AHashSet::new();
            let mut converted = Vec::new();
            let mut keep = |value: String| {
                if seen.insert(value.clone()) {
                    converted.push(value);
                }
            };
            for word in &words {
                match conversion.dict().match_word(word) {
                    Some(entry) if entry.num_values() > 0 => {
                        matched = true;
                        entry.values().iter().cloned().for_each(&mut keep);
                    }
                    _ => keep(conversion.convert(word)),
                }
            }
            words = converted;
        }
        debug!("convert_word {} -> {:?} (matched: {})", text, words, matched);
        (matched && !words.is_empty()).then_some(words)
    }

    /// Convert through the chain, picking a uniformly random value for every
    /// match. Succeeds if the result differs from `text`.
    pub fn random_convert_text(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let converter = self.converter()?;
        let mut rng = lock(&self.rng);
        let mut phrase = text.to_string();
        for conversion in converter.conversion_chain().conversions() {
            phrase = conversion.convert_with(&phrase, |entry| {
                entry.values().choose(&mut *rng).map(String::as_str)
            });
        }
        (phrase != text).then_some(phrase)
    }

    /// Default whole-text conversion. Succeeds if the result differs from
    /// `text`.
    pub fn convert_text(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let converted = self.converter()?.convert(text);
        (converted != text).then_some(converted)
    }
}

impl Drop for Opencc {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            hook.release();
        }
    }
}

impl std::fmt::Debug for Opencc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Opencc")
            .field("config_path", &self.config_path)
            .field("ready", &self.is_ready())
            .finish()
    }
}
