//! Candidate menu attached to a segment.
//!
//! The menu owns the (filtered) translation for its segment and caches
//! candidates as they are pulled, so indices stay stable once seen and the
//! underlying stream is only consumed as far as the consumer asked.

use crate::candidate::CandidateRef;
use crate::translation::Translation;

#[derive(Default)]
pub struct Menu {
    translation: Option<Box<dyn Translation>>,
    candidates: Vec<CandidateRef>,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_translation(translation: Box<dyn Translation>) -> Self {
        Self {
            translation: Some(translation),
            candidates: Vec::new(),
        }
    }

    /// Pull candidates until `count` are cached or the stream runs dry.
    /// Returns the number of cached candidates.
    pub fn prepare(&mut self, count: usize) -> usize {
        while self.candidates.len() < count {
            let Some(translation) = self.translation.as_mut() else {
                break;
            };
            if translation.exhausted() {
                self.translation = None;
                break;
            }
            if let Some(cand) = translation.peek() {
                self.candidates.push(cand);
            }
            translation.next();
        }
        self.candidates.len()
    }

    /// A cached candidate. Call [`Menu::prepare`] first to pull further.
    pub fn get_candidate_at(&self, index: usize) -> Option<&CandidateRef> {
        self.candidates.get(index)
    }

    /// Number of candidates cached so far.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// True when no candidate is cached and the stream has nothing more.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
            && self.translation.as_ref().map_or(true, |t| t.exhausted())
    }

    pub fn candidates(&self) -> &[CandidateRef] {
        &self.candidates
    }
}

impl std::fmt::Debug for Menu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Menu")
            .field("candidates", &self.candidates)
            .field("streaming", &self.translation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;
    use crate::translation::FifoTranslation;
    use std::rc::Rc;

    fn menu_of(texts: &[&str]) -> Menu {
        let candies = texts
            .iter()
            .map(|t| Rc::new(Candidate::new("test", 0, 2, *t, 0.0)))
            .collect();
        Menu::from_translation(Box::new(FifoTranslation::from_candidates(candies)))
    }

    #[test]
    fn test_prepare_pulls_lazily() {
        let mut menu = menu_of(&["a", "b", "c"]);
        assert_eq!(menu.candidate_count(), 0);
        assert!(!menu.is_empty());

        assert_eq!(menu.prepare(2), 2);
        assert_eq!(menu.get_candidate_at(1).unwrap().text(), "b");
        assert!(menu.get_candidate_at(2).is_none());

        assert_eq!(menu.prepare(10), 3);
        assert_eq!(menu.get_candidate_at(2).unwrap().text(), "c");
    }

    #[test]
    fn test_empty_menu() {
        let mut menu = Menu::new();
        assert!(menu.is_empty());
        assert_eq!(menu.prepare(5), 0);
    }
}
