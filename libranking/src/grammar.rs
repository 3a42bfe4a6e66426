// Word-level bigram model for phrase-to-phrase transitions.
//
// Stores P(word2 | word1) and scores a candidate against the text around the
// caret. Implements `libime_core::Grammar` for the contextual ranking filter.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context as _, Result};
use libime_core::Grammar;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Log probability assigned to unseen bigrams. Scores are measured above it.
pub const LOG_PROBABILITY_FLOOR: f64 = -20.0;

/// Entry in a word's bigram distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BigramEntry {
    pub word: String,
    pub count: u32,
}

/// Word-level bigram counts
/// Maps word1 -> list of (word2, count) pairs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordBigram {
    data: HashMap<String, Vec<BigramEntry>>,
    /// Total frequency for each word1 (for normalization)
    totals: HashMap<String, u32>,
}

impl WordBigram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the probability P(word2 | word1)
    /// Returns 0.0 if the bigram doesn't exist
    pub fn get_probability(&self, word1: &str, word2: &str) -> f64 {
        let count = self
            .data
            .get(word1)
            .and_then(|entries| entries.iter().find(|e| e.word == word2))
            .map_or(0, |e| e.count);
        match self.totals.get(word1) {
            Some(&total) if total > 0 && count > 0 => f64::from(count) / f64::from(total),
            _ => 0.0,
        }
    }

    /// Natural log of P(word2 | word1), or the floor for unseen pairs
    pub fn get_log_probability(&self, word1: &str, word2: &str) -> f64 {
        let prob = self.get_probability(word1, word2);
        if prob > 0.0 {
            prob.ln()
        } else {
            LOG_PROBABILITY_FLOOR
        }
    }

    /// Add a bigram observation. Repeated pairs accumulate.
    pub fn add_bigram(&mut self, word1: &str, word2: &str, count: u32) {
        let entries = self.data.entry(word1.to_string()).or_default();
        match entries.iter_mut().find(|e| e.word == word2) {
            Some(entry) => entry.count = entry.count.saturating_add(count),
            None => entries.push(BigramEntry {
                word: word2.to_string(),
                count,
            }),
        }
        let total = self.totals.entry(word1.to_string()).or_insert(0);
        *total = total.saturating_add(count);
    }

    pub fn followers(&self, word1: &str) -> &[BigramEntry] {
        self.data.get(word1).map_or(&[], Vec::as_slice)
    }

    pub fn contains_head(&self, word1: &str) -> bool {
        self.data.contains_key(word1)
    }

    /// Load from bincode file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let model = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("decode {}", path.display()))?;
        Ok(model)
    }

    /// Save to bincode file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        bincode::serialize_into(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Import `word1<TAB>word2<TAB>count` lines. Blank lines and `#`
    /// comments are skipped.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut model = Self::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let [word1, word2, count] = fields.as_slice() else {
                bail!("{}:{}: expected 3 tab-separated fields", path.display(), n + 1);
            };
            let count: u32 = count
                .parse()
                .with_context(|| format!("{}:{}: bad count", path.display(), n + 1))?;
            model.add_bigram(word1, word2, count);
        }
        Ok(model)
    }

    /// Get number of unique word1 entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get total number of bigram pairs
    pub fn total_bigrams(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }
}

/// Options of the `[grammar]` schema table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GrammarOptions {
    /// bincode model, or a `.tsv` bigram list
    pub model: Option<PathBuf>,
    pub weight: f64,
    /// 0 disables the query cache
    pub cache_size: usize,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        Self {
            model: None,
            weight: 1.0,
            cache_size: 1024,
        }
    }
}

type QueryKey = (String, String, bool);

/// [`Grammar`] over a [`WordBigram`] model.
///
/// `query(context, word, false)` looks up the longest suffix of `context`
/// that the model knows as a first word and scores `word` as its follower.
/// With `is_rear` set, `context` is the candidate and `word` is the text
/// after the caret, so the follower is the longest known word that `word`
/// starts with. Scores are `weight * (ln P - floor)`; unknown pairs score 0.
pub struct WordBigramGrammar {
    model: WordBigram,
    weight: f64,
    cache: Option<Mutex<LruCache<QueryKey, f64>>>,
}

impl WordBigramGrammar {
    pub fn new(model: WordBigram) -> Self {
        Self {
            model,
            weight: 1.0,
            cache: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        self
    }

    /// Load the model named in `options`, resolving a relative path against
    /// `base_dir`.
    pub fn from_options(options: &GrammarOptions, base_dir: &Path) -> Result<Option<Self>> {
        let Some(model_path) = &options.model else {
            return Ok(None);
        };
        let path = base_dir.join(model_path);
        let model = if path.extension().is_some_and(|ext| ext == "tsv") {
            WordBigram::from_tsv(&path)?
        } else {
            WordBigram::load(&path)?
        };
        debug!(
            "grammar {}: {} heads, {} bigrams",
            path.display(),
            model.len(),
            model.total_bigrams()
        );
        Ok(Some(
            Self::new(model)
                .with_weight(options.weight)
                .with_cache(options.cache_size),
        ))
    }

    pub fn model(&self) -> &WordBigram {
        &self.model
    }

    /// Longest suffix of `context` known as a first word.
    fn head<'a>(&self, context: &'a str) -> Option<&'a str> {
        context
            .char_indices()
            .map(|(i, _)| &context[i..])
            .find(|suffix| self.model.contains_head(suffix))
    }

    fn score(&self, context: &str, word: &str, is_rear: bool) -> f64 {
        let Some(head) = self.head(context) else {
            return 0.0;
        };
        let follower = if is_rear {
            self.model
                .followers(head)
                .iter()
                .filter(|e| !e.word.is_empty() && word.starts_with(e.word.as_str()))
                .max_by_key(|e| e.word.len())
                .map(|e| e.word.as_str())
        } else {
            Some(word)
        };
        let Some(follower) = follower else {
            return 0.0;
        };
        let log_p = self.model.get_log_probability(head, follower);
        if log_p <= LOG_PROBABILITY_FLOOR {
            return 0.0;
        }
        self.weight * (log_p - LOG_PROBABILITY_FLOOR)
    }
}

impl Grammar for WordBigramGrammar {
    fn query(&self, context: &str, word: &str, is_rear: bool) -> f64 {
        let Some(cache) = &self.cache else {
            return self.score(context, word, is_rear);
        };
        let key = (context.to_string(), word.to_string(), is_rear);
        if let Some(&hit) = cache.lock().unwrap_or_else(|p| p.into_inner()).get(&key) {
            return hit;
        }
        let score = self.score(context, word, is_rear);
        cache
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .put(key, score);
        score
    }
}
