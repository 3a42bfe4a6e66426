//! Tests for building and running filter chains from a schema
//!
//! Uses two toy filters:
//! - `suffix`: appends a configurable marker to every candidate's text
//! - `drop_short`: removes single-character candidates

use std::collections::VecDeque;
use std::rc::Rc;

use libime_core::{
    Candidate, CandidateRef, Context, Error, FifoTranslation, Filter, FilterChain,
    FilterRegistry, PrefetchTranslation, SchemaConfig, Translation,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SuffixOptions {
    marker: String,
}

struct Suffix {
    marker: String,
}

impl Filter for Suffix {
    fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        _context: Option<&Context>,
    ) -> Box<dyn Translation> {
        let marker = self.marker.clone();
        Box::new(PrefetchTranslation::new(
            translation,
            move |up: &mut dyn Translation, cache: &mut VecDeque<CandidateRef>| {
                let Some(c) = up.peek() else {
                    return false;
                };
                up.next();
                let text = format!("{}{}", c.text(), marker);
                cache.push_back(Rc::new(Candidate::shadow(&c, "suffixed", text, "", false)));
                true
            },
        ))
    }
}

struct DropShort;

impl Filter for DropShort {
    fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        _context: Option<&Context>,
    ) -> Box<dyn Translation> {
        Box::new(PrefetchTranslation::new(
            translation,
            |up: &mut dyn Translation, cache: &mut VecDeque<CandidateRef>| {
                let Some(c) = up.peek() else {
                    return false;
                };
                up.next();
                if c.text().chars().count() > 1 {
                    cache.push_back(c);
                }
                !cache.is_empty()
            },
        ))
    }
}

fn registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry.register("suffix", |ticket| {
        let opts: SuffixOptions = ticket.schema.section(&ticket.name_space)?;
        Ok(Box::new(Suffix {
            marker: opts.marker,
        }))
    });
    registry.register("drop_short", |_| Ok(Box::new(DropShort)));
    registry
}

fn source(texts: &[&str]) -> Box<dyn Translation> {
    Box::new(FifoTranslation::from_candidates(
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Rc::new(Candidate::new("table", 0, 2, *t, -(i as f64))))
            .collect(),
    ))
}

fn texts(mut t: Box<dyn Translation>) -> Vec<String> {
    t.iter().map(|c| c.text().to_string()).collect()
}

#[test]
fn test_chain_applies_filters_in_schema_order() {
    let schema = SchemaConfig::from_toml_str(
        r#"
filters = ["drop_short", "suffix@star"]

[star]
marker = "*"
"#,
    )
    .unwrap();
    let mut chain = FilterChain::from_schema(&schema, &registry(), None);
    assert_eq!(chain.names(), vec!["drop_short", "suffix@star"]);

    let out = chain.apply(source(&["中", "中国", "中文"]), None);
    assert_eq!(texts(out), vec!["中国*", "中文*"]);
}

#[test]
fn test_order_matters() {
    // Suffixing first makes every candidate long enough to survive.
    let schema = SchemaConfig::from_toml_str(
        r#"
filters = ["suffix", "drop_short"]

[suffix]
marker = "!"
"#,
    )
    .unwrap();
    let mut chain = FilterChain::from_schema(&schema, &registry(), None);
    let out = chain.apply(source(&["中", "中国"]), None);
    assert_eq!(texts(out), vec!["中!", "中国!"]);
}

#[test]
fn test_unbuildable_filters_are_skipped() {
    let schema = SchemaConfig::from_toml_str(
        r#"
filters = ["missing", "suffix", "drop_short"]

[suffix]
marker = 42
"#,
    )
    .unwrap();
    let mut chain = FilterChain::from_schema(&schema, &registry(), None);
    assert_eq!(chain.names(), vec!["drop_short"]);
    assert_eq!(texts(chain.apply(source(&["a", "ab"]), None)), vec!["ab"]);
}

#[test]
fn test_invalid_options_surface_from_factory() {
    let schema = SchemaConfig::from_toml_str("[suffix]\nmarker = 42\n").unwrap();
    let ticket = libime_core::Ticket::new(&schema, "suffix");
    let err = registry().create(&ticket).err().unwrap();
    assert!(matches!(err, Error::InvalidOptions { namespace, .. } if namespace == "suffix"));
}

#[test]
fn test_empty_chain_is_identity() {
    let mut chain = FilterChain::new();
    assert!(chain.is_empty());
    let out = chain.apply(source(&["x", "y"]), None);
    assert_eq!(texts(out), vec!["x", "y"]);
}

#[test]
fn test_shadow_keeps_original_reachable() {
    let schema = SchemaConfig::from_toml_str("filters = [\"suffix\"]\n[suffix]\nmarker = \"~\"\n")
        .unwrap();
    let mut chain = FilterChain::from_schema(&schema, &registry(), None);
    let mut out = chain.apply(source(&["字"]), None);
    let c = out.peek().unwrap();
    assert_eq!(c.text(), "字~");
    assert_eq!(c.kind(), "suffixed");
    assert_eq!(c.genuine().text(), "字");
    assert_eq!(c.genuine().kind(), "table");
}
