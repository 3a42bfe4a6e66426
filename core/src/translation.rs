//! Lazy candidate streams.
//!
//! A `Translation` is a forward-only, possibly infinite sequence of candidates.
//! Consumers look at the head with `peek()` and move on with `next()`. Once a
//! stream reports `exhausted()` it never yields another candidate.
//!
//! Provided streams:
//! - `FifoTranslation`: a finite queue built up front
//! - `PrefetchTranslation`: wraps an upstream stream and buffers transformed
//!   results in an internal cache refilled through a [`Replenish`] hook
//! - `UnionTranslation`: plays several streams back to back

use std::collections::VecDeque;

use crate::candidate::CandidateRef;

/// A lazy, forward-only candidate stream.
pub trait Translation {
    /// The candidate at the head of the stream, without consuming it.
    fn peek(&mut self) -> Option<CandidateRef>;

    /// Advance past the head. Returns false if there was nothing to advance.
    fn next(&mut self) -> bool;

    fn exhausted(&self) -> bool;
}

impl dyn Translation + '_ {
    /// Consume the stream as an iterator of candidates.
    pub fn iter(&mut self) -> TranslationIter<'_> {
        TranslationIter { inner: self }
    }

    /// Pull at most `limit` candidates off the head of the stream.
    pub fn take_candidates(&mut self, limit: usize) -> Vec<CandidateRef> {
        self.iter().take(limit).collect()
    }
}

/// Iterator adapter returned by `Translation::iter`.
pub struct TranslationIter<'a> {
    inner: &'a mut dyn Translation,
}

impl Iterator for TranslationIter<'_> {
    type Item = CandidateRef;

    fn next(&mut self) -> Option<CandidateRef> {
        while !self.inner.exhausted() {
            let head = self.inner.peek();
            self.inner.next();
            if head.is_some() {
                return head;
            }
        }
        None
    }
}

/// A finite stream over candidates appended before consumption starts.
#[derive(Debug, Default)]
pub struct FifoTranslation {
    candies: Vec<CandidateRef>,
    cursor: usize,
    drained: bool,
}

impl FifoTranslation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_candidates(candies: Vec<CandidateRef>) -> Self {
        Self {
            candies,
            cursor: 0,
            drained: false,
        }
    }

    /// Append a candidate. Ignored once the stream has been drained.
    pub fn append(&mut self, candy: CandidateRef) -> bool {
        if self.drained {
            return false;
        }
        self.candies.push(candy);
        true
    }

    /// Number of candidates not yet consumed.
    pub fn len(&self) -> usize {
        self.candies.len().saturating_sub(self.cursor)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Translation for FifoTranslation {
    fn peek(&mut self) -> Option<CandidateRef> {
        if self.exhausted() {
            return None;
        }
        self.candies.get(self.cursor).cloned()
    }

    fn next(&mut self) -> bool {
        if self.exhausted() {
            return false;
        }
        self.cursor += 1;
        if self.cursor >= self.candies.len() {
            self.drained = true;
        }
        true
    }

    fn exhausted(&self) -> bool {
        self.drained || self.cursor >= self.candies.len()
    }
}

/// Refill hook for [`PrefetchTranslation`].
///
/// Pull items from `upstream`, transforming or dropping each, and push the
/// results onto `cache`. Keep pulling until the cache holds something or the
/// upstream is exhausted: returning false means both are empty, and the
/// prefetching stream then falls back to the raw upstream.
pub trait Replenish {
    fn replenish(
        &mut self,
        upstream: &mut dyn Translation,
        cache: &mut VecDeque<CandidateRef>,
    ) -> bool;
}

impl<F> Replenish for F
where
    F: FnMut(&mut dyn Translation, &mut VecDeque<CandidateRef>) -> bool,
{
    fn replenish(
        &mut self,
        upstream: &mut dyn Translation,
        cache: &mut VecDeque<CandidateRef>,
    ) -> bool {
        self(upstream, cache)
    }
}

/// Stream that serves an internal cache ahead of its upstream.
pub struct PrefetchTranslation<R> {
    upstream: Box<dyn Translation>,
    cache: VecDeque<CandidateRef>,
    replenisher: R,
    exhausted: bool,
}

impl<R: Replenish> PrefetchTranslation<R> {
    pub fn new(upstream: Box<dyn Translation>, replenisher: R) -> Self {
        let exhausted = upstream.exhausted();
        Self {
            upstream,
            cache: VecDeque::new(),
            replenisher,
            exhausted,
        }
    }

    /// Number of candidates currently buffered.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl<R: Replenish> Translation for PrefetchTranslation<R> {
    fn peek(&mut self) -> Option<CandidateRef> {
        if self.exhausted {
            return None;
        }
        if !self.cache.is_empty()
            || self
                .replenisher
                .replenish(self.upstream.as_mut(), &mut self.cache)
        {
            self.cache.front().cloned()
        } else {
            self.upstream.peek()
        }
    }

    fn next(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        if self.cache.pop_front().is_none() {
            self.upstream.next();
        }
        if self.cache.is_empty() && self.upstream.exhausted() {
            self.exhausted = true;
        }
        true
    }

    fn exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Concatenation of streams, consumed in the order they were pushed.
#[derive(Default)]
pub struct UnionTranslation {
    translations: VecDeque<Box<dyn Translation>>,
    drained: bool,
}

impl UnionTranslation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `translation` after the streams already held. Exhausted streams
    /// are dropped, and nothing is accepted once the union has been drained.
    pub fn push(&mut self, translation: Box<dyn Translation>) -> bool {
        if self.drained || translation.exhausted() {
            return false;
        }
        self.translations.push_back(translation);
        true
    }
}

impl Translation for UnionTranslation {
    fn peek(&mut self) -> Option<CandidateRef> {
        self.translations.front_mut()?.peek()
    }

    fn next(&mut self) -> bool {
        let Some(front) = self.translations.front_mut() else {
            return false;
        };
        front.next();
        if front.exhausted() {
            self.translations.pop_front();
            if self.translations.is_empty() {
                self.drained = true;
            }
        }
        true
    }

    fn exhausted(&self) -> bool {
        self.translations.is_empty()
    }
}
