//! Session context read by filters.
//!
//! The `Context` is a plain data container the host application and the
//! session write into; filters only read it. It carries the raw input and its
//! segmentation, runtime switches (options), the text surrounding the caret
//! as reported by the host, and a short history of committed text.

use std::collections::VecDeque;

use ahash::AHashMap;

use crate::segmentation::Segmentation;

/// Maximum number of records kept in a [`CommitHistory`].
pub const COMMIT_HISTORY_CAPACITY: usize = 20;

/// One committed piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub kind: String,
    pub text: String,
}

/// Bounded history of committed text, newest last.
#[derive(Debug, Clone, Default)]
pub struct CommitHistory {
    records: VecDeque<CommitRecord>,
}

impl CommitHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<K: Into<String>, T: Into<String>>(&mut self, kind: K, text: T) {
        self.records.push_back(CommitRecord {
            kind: kind.into(),
            text: text.into(),
        });
        while self.records.len() > COMMIT_HISTORY_CAPACITY {
            self.records.pop_front();
        }
    }

    /// Text of the newest record, or "" when nothing was committed.
    pub fn latest_text(&self) -> &str {
        self.records.back().map_or("", |r| r.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommitRecord> {
        self.records.iter()
    }
}

/// Per-session state visible to filters.
#[derive(Debug, Default)]
pub struct Context {
    input: String,
    caret_pos: usize,
    segmentation: Segmentation,
    options: AHashMap<String, bool>,
    external_preceding_text: String,
    external_following_text: String,
    commit_history: CommitHistory,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the raw input, moving the caret to its end. The segmentation
    /// keeps whatever still matches the new input.
    pub fn set_input<S: Into<String>>(&mut self, input: S) {
        self.input = input.into();
        self.caret_pos = self.input.len();
        self.segmentation.amend(&self.input);
    }

    pub fn caret_pos(&self) -> usize {
        self.caret_pos
    }

    pub fn set_caret_pos(&mut self, caret_pos: usize) {
        self.caret_pos = caret_pos.min(self.input.len());
    }

    pub fn segmentation(&self) -> &Segmentation {
        &self.segmentation
    }

    pub fn segmentation_mut(&mut self) -> &mut Segmentation {
        &mut self.segmentation
    }

    /// Unset options read as `false`.
    pub fn get_option(&self, name: &str) -> bool {
        self.options.get(name).copied().unwrap_or(false)
    }

    pub fn set_option<S: Into<String>>(&mut self, name: S, value: bool) {
        self.options.insert(name.into(), value);
    }

    /// Text before the caret as reported by the host application.
    pub fn external_preceding_text(&self) -> &str {
        &self.external_preceding_text
    }

    /// Text after the caret as reported by the host application.
    pub fn external_following_text(&self) -> &str {
        &self.external_following_text
    }

    pub fn set_context_text<P: Into<String>, F: Into<String>>(&mut self, preceding: P, following: F) {
        self.external_preceding_text = preceding.into();
        self.external_following_text = following.into();
    }

    pub fn clear_context_text(&mut self) {
        self.external_preceding_text.clear();
        self.external_following_text.clear();
    }

    /// Preceding text tracked by the session itself: the latest commit.
    pub fn internal_preceding_text(&self) -> &str {
        self.commit_history.latest_text()
    }

    pub fn commit_history(&self) -> &CommitHistory {
        &self.commit_history
    }

    pub fn commit_history_mut(&mut self) -> &mut CommitHistory {
        &mut self.commit_history
    }

    /// Record `text` as committed and clear the composition.
    pub fn commit<K: Into<String>, T: Into<String>>(&mut self, kind: K, text: T) {
        self.commit_history.push(kind, text);
        self.clear();
    }

    /// Drop the composition (input, caret and segments). Options, host
    /// context and history are kept.
    pub fn clear(&mut self) {
        self.input.clear();
        self.caret_pos = 0;
        self.segmentation.reset("");
    }

    /// Check if there's an active composition.
    pub fn is_composing(&self) -> bool {
        !self.input.is_empty()
    }
}
