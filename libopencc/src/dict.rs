//! Conversion dictionaries.
//!
//! A dictionary maps a source key to one or more target values; the first
//! value is the default conversion. Two lookups are supported: exact match on
//! a whole word, and longest match on a prefix of some text.
//!
//! `TextDict` stores keys in an `fst::Map` (key -> entry index) with the
//! entries themselves in a parallel vector. Text dictionaries use the OpenCC
//! plain format, one entry per line:
//!
//! ```text
//! 里	里 裏
//! 后	后 後
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use fst::raw::Output;
use fst::Map;
use tracing::debug;

use crate::error::{OpenccError, Result};

/// A key and its target values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    key: String,
    values: Vec<String>,
}

impl DictEntry {
    pub fn new<K: Into<String>>(key: K, values: Vec<String>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key length in bytes.
    pub fn key_length(&self) -> usize {
        self.key.len()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// The first value, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// Matching interface shared by all dictionary kinds.
pub trait Dictionary: Send + Sync {
    /// Entry whose key equals `word`.
    fn match_word(&self, word: &str) -> Option<&DictEntry>;

    /// Entry with the longest key that is a prefix of `text`.
    fn match_prefix(&self, text: &str) -> Option<&DictEntry>;
}

/// Shared handle to a dictionary.
pub type DictRef = Arc<dyn Dictionary>;

/// Sorted, fst-indexed dictionary.
#[derive(Debug, Clone)]
pub struct TextDict {
    index: Map<Vec<u8>>,
    entries: Vec<DictEntry>,
}

impl TextDict {
    /// Build from entries in any order. Duplicate keys keep the first entry;
    /// empty keys are rejected.
    pub fn from_entries(mut entries: Vec<DictEntry>) -> Result<Self> {
        if entries.iter().any(|e| e.key.is_empty()) {
            return Err(OpenccError::MalformedDict {
                path: Default::default(),
                line: 0,
                message: "empty key".to_string(),
            });
        }
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries.dedup_by(|later, earlier| later.key == earlier.key);
        let index = Map::from_iter(
            entries
                .iter()
                .enumerate()
                .map(|(i, e)| (e.key.as_bytes(), i as u64)),
        )?;
        Ok(Self { index, entries })
    }

    /// Parse the OpenCC text format. `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for (n, line) in content.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let malformed = |message: &str| OpenccError::MalformedDict {
                path: path.to_path_buf(),
                line: n + 1,
                message: message.to_string(),
            };
            let (key, values) = line.split_once('\t').ok_or_else(|| malformed("missing tab"))?;
            if key.is_empty() {
                return Err(malformed("empty key"));
            }
            let values = values.split(' ').filter(|v| !v.is_empty()).map(str::to_string).collect();
            entries.push(DictEntry::new(key, values));
        }
        Self::from_entries(entries)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| OpenccError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let dict = Self::parse(&content, path)?;
        debug!("loaded {} entries from {}", dict.len(), path.display());
        Ok(dict)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }

    fn entry(&self, index: u64) -> Option<&DictEntry> {
        self.entries.get(usize::try_from(index).ok()?)
    }
}

impl Dictionary for TextDict {
    fn match_word(&self, word: &str) -> Option<&DictEntry> {
        if word.is_empty() {
            return None;
        }
        self.entry(self.index.get(word)?)
    }

    fn match_prefix(&self, text: &str) -> Option<&DictEntry> {
        // Walk the automaton byte by byte, remembering the last final state.
        let fst = self.index.as_fst();
        let mut node = fst.root();
        let mut output = Output::zero();
        let mut longest = None;
        for (i, &byte) in text.as_bytes().iter().enumerate() {
            let Some(t) = node.find_input(byte).map(|idx| node.transition(idx)) else {
                break;
            };
            output = output.cat(t.out);
            node = fst.node(t.addr);
            if node.is_final() && text.is_char_boundary(i + 1) {
                longest = Some(output.cat(node.final_output()).value());
            }
        }
        self.entry(longest?)
    }
}

/// Dictionaries consulted in order.
#[derive(Clone, Default)]
pub struct DictGroup {
    dicts: Vec<DictRef>,
}

impl DictGroup {
    pub fn new(dicts: Vec<DictRef>) -> Self {
        Self { dicts }
    }

    pub fn dicts(&self) -> &[DictRef] {
        &self.dicts
    }
}

impl Dictionary for DictGroup {
    fn match_word(&self, word: &str) -> Option<&DictEntry> {
        self.dicts.iter().find_map(|d| d.match_word(word))
    }

    fn match_prefix(&self, text: &str) -> Option<&DictEntry> {
        let mut best: Option<&DictEntry> = None;
        for entry in self.dicts.iter().filter_map(|d| d.match_prefix(text)) {
            if best.map_or(true, |b| entry.key_length() > b.key_length()) {
                best = Some(entry);
            }
        }
        best
    }
}
