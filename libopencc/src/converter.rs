//! Conversion stages and the converter that runs them.
//!
//! - `Conversion`: greedy longest-prefix conversion through one dictionary
//! - `ConversionChain`: conversions applied one after another
//! - `MaxMatchSegmentation`: optional pre-split of the input into phrases
//! - `Converter`: segmentation followed by the chain, per segment

use std::sync::Arc;

use crate::dict::{DictEntry, DictRef};

/// One conversion stage backed by a single dictionary.
#[derive(Clone)]
pub struct Conversion {
    dict: DictRef,
}

impl Conversion {
    pub fn new(dict: DictRef) -> Self {
        Self { dict }
    }

    pub fn dict(&self) -> &DictRef {
        &self.dict
    }

    /// Convert `phrase` using each match's default value.
    pub fn convert(&self, phrase: &str) -> String {
        self.convert_with(phrase, |entry| entry.default_value())
    }

    /// Convert `phrase` left to right, taking the longest prefix match at
    /// each position and emitting whatever `pick` chooses for it. Positions
    /// with no match, or where `pick` yields nothing, copy one character.
    pub fn convert_with<F>(&self, phrase: &str, mut pick: F) -> String
    where
        F: FnMut(&DictEntry) -> Option<&str>,
    {
        let mut out = String::with_capacity(phrase.len());
        let mut rest = phrase;
        while let Some(ch) = rest.chars().next() {
            let matched = self
                .dict
                .match_prefix(rest)
                .filter(|entry| entry.key_length() > 0)
                .and_then(|entry| pick(entry).map(|value| (entry.key_length(), value)));
            let step = match matched {
                Some((len, value)) => {
                    out.push_str(value);
                    len
                }
                None => {
                    out.push(ch);
                    ch.len_utf8()
                }
            };
            rest = &rest[step..];
        }
        out
    }
}

/// Ordered conversion stages.
#[derive(Clone, Default)]
pub struct ConversionChain {
    conversions: Vec<Conversion>,
}

impl ConversionChain {
    pub fn new(conversions: Vec<Conversion>) -> Self {
        Self { conversions }
    }

    pub fn conversions(&self) -> &[Conversion] {
        &self.conversions
    }

    pub fn is_empty(&self) -> bool {
        self.conversions.is_empty()
    }

    pub fn convert(&self, phrase: &str) -> String {
        self.conversions
            .iter()
            .fold(phrase.to_string(), |text, conversion| conversion.convert(&text))
    }
}

/// Greedy maximum-match segmentation. Unmatched characters are grouped
/// into a single segment until the next match.
#[derive(Clone)]
pub struct MaxMatchSegmentation {
    dict: DictRef,
}

impl MaxMatchSegmentation {
    pub fn new(dict: DictRef) -> Self {
        Self { dict }
    }

    pub fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut segments = Vec::new();
        let mut unmatched_start = None;
        let mut pos = 0;
        while let Some(ch) = text[pos..].chars().next() {
            match self.dict.match_prefix(&text[pos..]).map(DictEntry::key_length) {
                Some(len) if len > 0 => {
                    if let Some(start) = unmatched_start.take() {
                        segments.push(&text[start..pos]);
                    }
                    segments.push(&text[pos..pos + len]);
                    pos += len;
                }
                _ => {
                    unmatched_start.get_or_insert(pos);
                    pos += ch.len_utf8();
                }
            }
        }
        if let Some(start) = unmatched_start {
            segments.push(&text[start..]);
        }
        segments
    }
}

/// A loaded conversion configuration.
#[derive(Clone)]
pub struct Converter {
    name: String,
    segmentation: Option<MaxMatchSegmentation>,
    chain: Arc<ConversionChain>,
}

impl Converter {
    pub fn new(
        name: String,
        segmentation: Option<MaxMatchSegmentation>,
        chain: ConversionChain,
    ) -> Self {
        Self {
            name,
            segmentation,
            chain: Arc::new(chain),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn conversion_chain(&self) -> &Arc<ConversionChain> {
        &self.chain
    }

    /// Whole-text conversion with default values.
    pub fn convert(&self, text: &str) -> String {
        match &self.segmentation {
            Some(seg) => seg
                .segment(text)
                .into_iter()
                .map(|segment| self.chain.convert(segment))
                .collect(),
            None => self.chain.convert(text),
        }
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("segmentation", &self.segmentation.is_some())
            .field("conversions", &self.chain.conversions().len())
            .finish()
    }
}
