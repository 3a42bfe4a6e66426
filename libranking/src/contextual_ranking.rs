//! Contextual ranking filter.
//!
//! Re-orders the head of a candidate stream by how well each candidate fits
//! the text around the caret, as judged by a [`Grammar`]. The filter works
//! on a budget: it stays out of the way for short inputs and fast typing,
//! and only looks at the first `max_rerank_candidates` candidates. Everything
//! after them follows in the original order.
//!
//! Gates, checked in order (any hit returns the stream unchanged):
//! 1. disabled, no grammar, or nothing to rank
//! 2. no session context
//! 3. input shorter than `min_input_length`
//! 4. less than `debounce_delay_ms` since the previous call that got here,
//!    or since construction for the first call
//! 5. no text on either side of the caret

use std::sync::Arc;
use std::time::{Duration, Instant};

use libime_core::{
    CandidateRef, Context, FifoTranslation, Filter, Grammar, Ticket, Translation,
    UnionTranslation,
};
use serde::Deserialize;
use tracing::{debug, info};

pub const CONTEXTUAL_RANKING_FILTER: &str = "contextual_ranking_filter";

/// Fewer collected candidates than this are emitted in stream order.
const MIN_CANDIDATES_TO_SORT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    pub contextual_ranking: bool,
    pub max_rerank_candidates: usize,
    /// In bytes of raw input.
    pub min_input_length: usize,
    pub debounce_delay_ms: u64,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            contextual_ranking: true,
            max_rerank_candidates: 8,
            min_input_length: 2,
            debounce_delay_ms: 100,
        }
    }
}

pub struct ContextualRankingFilter {
    grammar: Option<Arc<dyn Grammar>>,
    options: RankingOptions,
    last_input_time: Instant,
}

impl ContextualRankingFilter {
    pub fn new(grammar: Option<Arc<dyn Grammar>>, options: RankingOptions) -> Self {
        info!(
            "contextual ranking: enabled={} max_rerank_candidates={} min_input_length={} debounce_delay_ms={} grammar={}",
            options.contextual_ranking,
            options.max_rerank_candidates,
            options.min_input_length,
            options.debounce_delay_ms,
            grammar.is_some()
        );
        Self {
            grammar,
            options,
            last_input_time: Instant::now(),
        }
    }

    /// Factory used by the filter registry.
    pub fn create(ticket: &Ticket) -> libime_core::Result<Box<dyn Filter>> {
        let options: RankingOptions = ticket.schema.section(&ticket.name_space)?;
        Ok(Box::new(Self::new(ticket.grammar.clone(), options)))
    }

    pub fn options(&self) -> &RankingOptions {
        &self.options
    }

    /// [`Filter::apply`] with an explicit clock reading.
    pub fn apply_at(
        &mut self,
        mut translation: Box<dyn Translation>,
        context: Option<&Context>,
        now: Instant,
    ) -> Box<dyn Translation> {
        let grammar = match &self.grammar {
            Some(grammar) if self.options.contextual_ranking && !translation.exhausted() => {
                Arc::clone(grammar)
            }
            _ => return translation,
        };
        let Some(ctx) = context else {
            return translation;
        };

        let input_length = ctx.input().len();
        if input_length < self.options.min_input_length {
            debug!(
                "contextual ranking skipped: input too short ({} < {})",
                input_length, self.options.min_input_length
            );
            return translation;
        }

        let elapsed = now.saturating_duration_since(self.last_input_time);
        self.last_input_time = now;
        if elapsed < Duration::from_millis(self.options.debounce_delay_ms) {
            debug!(
                "contextual ranking skipped: typing too fast ({}ms < {}ms)",
                elapsed.as_millis(),
                self.options.debounce_delay_ms
            );
            return translation;
        }

        let left_context = match ctx.external_preceding_text() {
            "" => ctx.internal_preceding_text(),
            text => text,
        };
        let right_context = ctx.external_following_text();
        if left_context.is_empty() && right_context.is_empty() {
            debug!("contextual ranking skipped: no context");
            return translation;
        }
        info!(
            "contextual ranking triggered: input length {}, left={:?}, right={:?}",
            input_length, left_context, right_context
        );

        let started = Instant::now();
        let mut scored: Vec<(CandidateRef, f64)> = Vec::new();
        let mut queries = 0usize;
        while !translation.exhausted() && scored.len() < self.options.max_rerank_candidates {
            let Some(candidate) = translation.peek() else {
                translation.next();
                continue;
            };
            let mut left_score = 0.0;
            let mut right_score = 0.0;
            if !left_context.is_empty() {
                left_score = grammar.query(left_context, candidate.text(), false);
                queries += 1;
            }
            if !right_context.is_empty() {
                // The candidate is the context and the following text the word.
                right_score = grammar.query(candidate.text(), right_context, true);
                queries += 1;
            }
            let total = candidate.quality() + left_score + right_score;
            debug!(
                "candidate {:?} quality={} left={} right={} total={}",
                candidate.text(),
                candidate.quality(),
                left_score,
                right_score,
                total
            );
            scored.push((candidate, total));
            translation.next();
        }
        if scored.is_empty() {
            return translation;
        }

        if scored.len() < MIN_CANDIDATES_TO_SORT {
            debug!(
                "contextual ranking: too few candidates to sort ({})",
                scored.len()
            );
        } else {
            // Stable, so equal totals keep their stream order.
            scored.sort_by(|a, b| b.1.total_cmp(&a.1));
            for (candidate, total) in &scored {
                candidate.set_quality(*total);
            }
        }
        info!(
            "contextual ranking: {} candidates, {} queries in {}us",
            scored.len(),
            queries,
            started.elapsed().as_micros()
        );

        let head = FifoTranslation::from_candidates(
            scored.into_iter().map(|(candidate, _)| candidate).collect(),
        );
        let mut ranked = UnionTranslation::new();
        ranked.push(Box::new(head));
        ranked.push(translation);
        Box::new(ranked)
    }
}

impl Filter for ContextualRankingFilter {
    fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        context: Option<&Context>,
    ) -> Box<dyn Translation> {
        self.apply_at(translation, context, Instant::now())
    }
}
