//! Tests for the contextual ranking filter
//!
//! A table-driven grammar stands in for a real model: scores are looked up
//! by (context, word, is_rear) and every query is recorded.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use libime_core::{
    Candidate, CandidateRef, Context, FifoTranslation, Filter, FilterChain, FilterRegistry,
    Grammar, SchemaConfig, Translation,
};
use libranking::{ContextualRankingFilter, RankingOptions, WordBigram, WordBigramGrammar};

#[derive(Default)]
struct TableGrammar {
    scores: HashMap<(String, String, bool), f64>,
    queries: Mutex<Vec<(String, String, bool)>>,
}

impl TableGrammar {
    fn with(mut self, context: &str, word: &str, is_rear: bool, score: f64) -> Self {
        self.scores
            .insert((context.to_string(), word.to_string(), is_rear), score);
        self
    }

    fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

impl Grammar for TableGrammar {
    fn query(&self, context: &str, word: &str, is_rear: bool) -> f64 {
        let key = (context.to_string(), word.to_string(), is_rear);
        self.queries.lock().unwrap().push(key.clone());
        self.scores.get(&key).copied().unwrap_or(0.0)
    }
}

fn options() -> RankingOptions {
    RankingOptions {
        debounce_delay_ms: 0,
        ..RankingOptions::default()
    }
}

fn cands(items: &[(&str, f64)]) -> Vec<CandidateRef> {
    items
        .iter()
        .map(|(text, q)| Rc::new(Candidate::new("phrase", 0, 3, *text, *q)))
        .collect()
}

fn stream(cands: &[CandidateRef]) -> Box<dyn Translation> {
    Box::new(FifoTranslation::from_candidates(cands.to_vec()))
}

fn texts(mut t: Box<dyn Translation>) -> Vec<String> {
    t.iter().map(|c| c.text().to_string()).collect()
}

fn context(input: &str, left: &str, right: &str) -> Context {
    let mut ctx = Context::new();
    ctx.set_input(input);
    ctx.set_context_text(left, right);
    ctx
}

fn filter(grammar: Arc<TableGrammar>, options: RankingOptions) -> ContextualRankingFilter {
    ContextualRankingFilter::new(Some(grammar), options)
}

#[test]
fn test_left_context_promotes_likely_follower() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(grammar, options());
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0), ("犯", 1.0)]);
    let out = f.apply(stream(&input), Some(&context("fan", "吃", "")));

    assert_eq!(texts(out), vec!["饭", "反", "范", "犯"]);
    assert_eq!(input[2].quality(), 6.0);
    assert_eq!(input[0].quality(), 1.0);
}

#[test]
fn test_right_context_scores_candidate_as_context() {
    let grammar = Arc::new(TableGrammar::default().with("今天", "很好", true, 3.0));
    let mut f = filter(Arc::clone(&grammar), options());
    let input = cands(&[("金田", 2.0), ("今天", 0.0), ("津田", 1.0)]);
    let out = f.apply(stream(&input), Some(&context("jintian", "", "很好")));

    assert_eq!(texts(out), vec!["今天", "金田", "津田"]);
    let queries = grammar.queries.lock().unwrap();
    assert!(queries.iter().all(|(_, word, is_rear)| *is_rear && word == "很好"));
    assert_eq!(queries.len(), 3);
}

#[test]
fn test_two_candidates_keep_stream_order() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(grammar, options());
    let input = cands(&[("反", 1.0), ("饭", 1.0)]);
    let out = f.apply(stream(&input), Some(&context("fan", "吃", "")));

    assert_eq!(texts(out), vec!["反", "饭"]);
    assert_eq!(input[1].quality(), 1.0);
}

#[test]
fn test_tail_beyond_cap_is_untouched() {
    let grammar = Arc::new(
        TableGrammar::default()
            .with("吃", "c", false, 3.0)
            .with("吃", "e", false, 100.0),
    );
    let mut f = filter(
        Arc::clone(&grammar),
        RankingOptions {
            max_rerank_candidates: 3,
            ..options()
        },
    );
    let input = cands(&[("a", 0.0), ("b", 0.0), ("c", 0.0), ("d", 0.0), ("e", 0.0)]);
    let out = f.apply(stream(&input), Some(&context("abc", "吃", "")));

    assert_eq!(texts(out), vec!["c", "a", "b", "d", "e"]);
    assert_eq!(input[4].quality(), 0.0);
    assert_eq!(grammar.query_count(), 3);
}

#[test]
fn test_equal_scores_keep_relative_order() {
    let grammar = Arc::new(TableGrammar::default().with("x", "d", false, 1.0));
    let mut f = filter(grammar, options());
    let input = cands(&[("a", 1.0), ("b", 2.0), ("c", 1.0), ("d", 0.0), ("e", 2.0)]);
    let out = f.apply(stream(&input), Some(&context("ab", "x", "")));
    assert_eq!(texts(out), vec!["b", "e", "a", "c", "d"]);
}

#[test]
fn test_debounce_leaves_second_stream_untouched() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(
        grammar,
        RankingOptions {
            debounce_delay_ms: 100,
            ..options()
        },
    );
    let ctx = context("fan", "吃", "");
    // Well past construction, so the first call is ranked.
    let t0 = Instant::now() + Duration::from_millis(200);

    let first = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    assert_eq!(texts(f.apply_at(stream(&first), Some(&ctx), t0)), vec!["饭", "反", "范"]);

    let second = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    let mut out = f.apply_at(stream(&second), Some(&ctx), t0 + Duration::from_millis(50));
    let out: Vec<CandidateRef> = out.iter().collect();
    assert_eq!(out.len(), 3);
    for (got, want) in out.iter().zip(&second) {
        assert!(Rc::ptr_eq(got, want));
        assert_eq!(got.quality(), 1.0);
    }

    // The debounced call still moved the clock, so 60ms later is too soon.
    let third = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    let out = f.apply_at(stream(&third), Some(&ctx), t0 + Duration::from_millis(110));
    assert_eq!(texts(out), vec!["反", "范", "饭"]);

    let fourth = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    let out = f.apply_at(stream(&fourth), Some(&ctx), t0 + Duration::from_millis(300));
    assert_eq!(texts(out), vec!["饭", "反", "范"]);
}

#[test]
fn test_call_right_after_construction_is_debounced() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(
        grammar,
        RankingOptions {
            debounce_delay_ms: 10_000,
            ..options()
        },
    );
    let ctx = context("fan", "吃", "");
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    let out = f.apply_at(stream(&input), Some(&ctx), Instant::now());
    assert_eq!(texts(out), vec!["反", "范", "饭"]);
    assert_eq!(input[2].quality(), 1.0);
}

#[test]
fn test_short_input_passes_through() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(Arc::clone(&grammar), options());
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    let out = f.apply(stream(&input), Some(&context("f", "吃", "了")));
    assert_eq!(texts(out), vec!["反", "范", "饭"]);
    assert_eq!(grammar.query_count(), 0);
}

#[test]
fn test_gates_without_context() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);

    let mut f = filter(Arc::clone(&grammar), options());
    assert_eq!(texts(f.apply(stream(&input), None)), vec!["反", "范", "饭"]);
    let out = f.apply(stream(&input), Some(&context("fan", "", "")));
    assert_eq!(texts(out), vec!["反", "范", "饭"]);

    let mut disabled = filter(
        Arc::clone(&grammar),
        RankingOptions {
            contextual_ranking: false,
            ..options()
        },
    );
    let out = disabled.apply(stream(&input), Some(&context("fan", "吃", "")));
    assert_eq!(texts(out), vec!["反", "范", "饭"]);

    let mut no_grammar = ContextualRankingFilter::new(None, options());
    let out = no_grammar.apply(stream(&input), Some(&context("fan", "吃", "")));
    assert_eq!(texts(out), vec!["反", "范", "饭"]);
    assert_eq!(grammar.query_count(), 0);
}

#[test]
fn test_latest_commit_is_left_context() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "饭", false, 5.0));
    let mut f = filter(grammar, options());
    let mut ctx = Context::new();
    ctx.commit("phrase", "吃");
    ctx.set_input("fan");
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    assert_eq!(texts(f.apply(stream(&input), Some(&ctx))), vec!["饭", "反", "范"]);

    // Host-provided text wins over the commit history.
    ctx.set_context_text("想", "");
    let input = cands(&[("反", 1.0), ("范", 1.0), ("饭", 1.0)]);
    assert_eq!(texts(f.apply(stream(&input), Some(&ctx))), vec!["反", "范", "饭"]);
}

struct Gappy {
    items: Vec<Option<CandidateRef>>,
    cursor: usize,
}

impl Translation for Gappy {
    fn peek(&mut self) -> Option<CandidateRef> {
        self.items.get(self.cursor).cloned().flatten()
    }

    fn next(&mut self) -> bool {
        if self.exhausted() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }
}

#[test]
fn test_empty_peeks_do_not_count_toward_cap() {
    let grammar = Arc::new(TableGrammar::default().with("吃", "c", false, 9.0));
    let mut f = filter(
        Arc::clone(&grammar),
        RankingOptions {
            max_rerank_candidates: 3,
            ..options()
        },
    );
    let c = cands(&[("a", 0.0), ("b", 0.0), ("c", 0.0), ("d", 0.0)]);
    let gappy = Gappy {
        items: vec![
            None,
            Some(c[0].clone()),
            None,
            Some(c[1].clone()),
            Some(c[2].clone()),
            Some(c[3].clone()),
        ],
        cursor: 0,
    };
    let out = f.apply(Box::new(gappy), Some(&context("abc", "吃", "")));
    assert_eq!(texts(out), vec!["c", "a", "b", "d"]);
    assert_eq!(grammar.query_count(), 3);
}

#[test]
fn test_remainder_is_appended_lazily() {
    struct Endless(usize);
    impl Translation for Endless {
        fn peek(&mut self) -> Option<CandidateRef> {
            Some(Rc::new(Candidate::new("phrase", 0, 2, self.0.to_string(), 0.0)))
        }
        fn next(&mut self) -> bool {
            self.0 += 1;
            true
        }
        fn exhausted(&self) -> bool {
            false
        }
    }

    let grammar = Arc::new(TableGrammar::default().with("x", "2", false, 1.0));
    let mut f = filter(grammar, options());
    let mut out = f.apply(Box::new(Endless(0)), Some(&context("ab", "x", "")));
    let head: Vec<String> = out.iter().take(10).map(|c| c.text().to_string()).collect();
    assert_eq!(head, vec!["2", "0", "1", "3", "4", "5", "6", "7", "8", "9"]);
}

#[test]
fn test_word_bigram_grammar_end_to_end() {
    let mut model = WordBigram::new();
    model.add_bigram("吃", "饭", 8);
    model.add_bigram("吃", "面", 2);
    let grammar: Arc<dyn Grammar> = Arc::new(WordBigramGrammar::new(model));

    let schema = SchemaConfig::from_toml_str(
        "filters = [\"contextual_ranking_filter\"]\n[contextual_ranking_filter]\ndebounce_delay_ms = 0\n",
    )
    .unwrap();
    let mut registry = FilterRegistry::new();
    libranking::register(&mut registry);
    let mut chain = FilterChain::from_schema(&schema, &registry, Some(grammar));
    assert_eq!(chain.len(), 1);

    let input = cands(&[("反", 0.0), ("面", 0.0), ("饭", 0.0)]);
    let out = chain.apply(stream(&input), Some(&context("fan", "我想吃", "")));
    assert_eq!(texts(out), vec!["饭", "面", "反"]);
    assert!(input[2].quality() > input[1].quality());
    assert_eq!(input[0].quality(), 0.0);
}

#[test]
fn test_invalid_options_skip_filter() {
    let schema = SchemaConfig::from_toml_str(
        "filters = [\"contextual_ranking_filter\"]\n[contextual_ranking_filter]\nmax_rerank_candidates = -1\n",
    )
    .unwrap();
    let mut registry = FilterRegistry::new();
    libranking::register(&mut registry);
    assert!(FilterChain::from_schema(&schema, &registry, None).is_empty());
}
