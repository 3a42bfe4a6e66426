//! Candidate types for filter pipelines.
//!
//! This module provides:
//! - `Candidate`: A single proposed output for a segment, with a mutable quality
//! - `CandidateRef`: The shared handle streams and filters pass around
//!
//! A candidate produced upstream is shared between the stream that yielded it
//! and every filter that looks at it, so re-ranking a candidate's quality is
//! visible to any later consumer. Filters that only want to change how a
//! candidate is presented wrap it in a shadow (see [`Candidate::shadow`]).

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a candidate.
pub type CandidateRef = Rc<Candidate>;

/// A single text candidate answering for `[start, end)` of the input.
///
/// Quality is on a relative scale; higher is better.
pub struct Candidate {
    kind: String,
    start: usize,
    end: usize,
    text: String,
    comment: String,
    preedit: String,
    quality: Cell<f64>,
    /// Set for shadow candidates.
    original: Option<CandidateRef>,
    inherit_comment: bool,
}

impl Candidate {
    pub fn new<K, T>(kind: K, start: usize, end: usize, text: T, quality: f64) -> Self
    where
        K: Into<String>,
        T: Into<String>,
    {
        Self {
            kind: kind.into(),
            start,
            end,
            text: text.into(),
            comment: String::new(),
            preedit: String::new(),
            quality: Cell::new(quality),
            original: None,
            inherit_comment: false,
        }
    }

    /// Builder-style comment setter.
    pub fn with_comment<C: Into<String>>(mut self, comment: C) -> Self {
        self.comment = comment.into();
        self
    }

    /// Builder-style preedit setter.
    pub fn with_preedit<P: Into<String>>(mut self, preedit: P) -> Self {
        self.preedit = preedit.into();
        self
    }

    /// Wrap `original` in a shadow candidate of type `kind`.
    ///
    /// An empty `text` shows the original's text. An empty `comment` shows the
    /// original's comment only when `inherit_comment` is set. Span, preedit and
    /// the current quality are taken from the original.
    pub fn shadow<K, T, C>(
        original: &CandidateRef,
        kind: K,
        text: T,
        comment: C,
        inherit_comment: bool,
    ) -> Self
    where
        K: Into<String>,
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            kind: kind.into(),
            start: original.start,
            end: original.end,
            text: text.into(),
            comment: comment.into(),
            preedit: original.preedit.clone(),
            quality: Cell::new(original.quality()),
            original: Some(Rc::clone(original)),
            inherit_comment,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn text(&self) -> &str {
        match &self.original {
            Some(original) if self.text.is_empty() => original.text(),
            _ => &self.text,
        }
    }

    pub fn comment(&self) -> &str {
        match &self.original {
            Some(original) if self.comment.is_empty() && self.inherit_comment => {
                original.comment()
            }
            _ => &self.comment,
        }
    }

    pub fn preedit(&self) -> &str {
        &self.preedit
    }

    pub fn quality(&self) -> f64 {
        self.quality.get()
    }

    /// Overwrite the ranking quality. Visible through every shared handle.
    pub fn set_quality(&self, quality: f64) {
        self.quality.set(quality);
    }

    /// The wrapped candidate, if this is a shadow.
    pub fn original(&self) -> Option<&CandidateRef> {
        self.original.as_ref()
    }

    /// Follow shadow links down to the candidate that was generated upstream.
    pub fn genuine(&self) -> &Candidate {
        let mut current = self;
        while let Some(original) = &current.original {
            current = original;
        }
        current
    }

    pub fn is_shadow(&self) -> bool {
        self.original.is_some()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("kind", &self.kind)
            .field("span", &(self.start..self.end))
            .field("text", &self.text())
            .field("comment", &self.comment())
            .field("quality", &self.quality())
            .field("shadow", &self.is_shadow())
            .finish()
    }
}
