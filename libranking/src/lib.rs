//! libranking
//!
//! Context-aware re-ranking of candidate streams.
//!
//! Public API:
//! - `ContextualRankingFilter` - Re-orders the head of a stream by grammar score
//! - `WordBigramGrammar` - `Grammar` backed by word bigram counts

pub mod contextual_ranking;
pub use contextual_ranking::{ContextualRankingFilter, RankingOptions, CONTEXTUAL_RANKING_FILTER};

pub mod grammar;
pub use grammar::{GrammarOptions, WordBigram, WordBigramGrammar};

/// Register this crate's filters.
pub fn register(registry: &mut libime_core::FilterRegistry) {
    registry.register(CONTEXTUAL_RANKING_FILTER, ContextualRankingFilter::create);
}
