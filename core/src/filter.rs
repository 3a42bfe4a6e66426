//! Filter stages and their composition.
//!
//! A filter turns one candidate stream into another. Filters are created by
//! name from a [`FilterRegistry`] and composed into a [`FilterChain`] in the
//! order the schema lists them. A filter that cannot be built is logged and
//! left out; a filter never aborts the stream it is given.

use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;
use tracing::{debug, warn};

use crate::config::{DataDirs, SchemaConfig};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::translation::Translation;

/// A stream-to-stream transformation.
pub trait Filter {
    /// Transform `translation`. Filters that decide not to act return the
    /// input unchanged.
    fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        context: Option<&Context>,
    ) -> Box<dyn Translation>;
}

/// Everything a factory needs to build one filter instance.
#[derive(Clone)]
pub struct Ticket<'a> {
    pub schema: &'a SchemaConfig,
    /// Registered filter name, e.g. `simplifier`.
    pub klass: String,
    /// Schema table holding this instance's options.
    pub name_space: String,
    pub data_dirs: DataDirs,
    /// Scoring service supplied by the host, if any.
    pub grammar: Option<Arc<dyn Grammar>>,
}

impl<'a> Ticket<'a> {
    /// Build a ticket from a filter list entry: `klass` or `klass@name_space`.
    pub fn new(schema: &'a SchemaConfig, entry: &str) -> Self {
        let (klass, name_space) = match entry.split_once('@') {
            Some((klass, ns)) if !ns.is_empty() => (klass, ns),
            Some((klass, _)) => (klass, klass),
            None => (entry, entry),
        };
        Self {
            schema,
            klass: klass.to_string(),
            name_space: name_space.to_string(),
            data_dirs: schema.data_dirs().unwrap_or_else(|e| {
                warn!("ignoring data directories: {}", e);
                DataDirs::default()
            }),
            grammar: None,
        }
    }

    pub fn with_grammar(mut self, grammar: Option<Arc<dyn Grammar>>) -> Self {
        self.grammar = grammar;
        self
    }
}

impl fmt::Debug for Ticket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("klass", &self.klass)
            .field("name_space", &self.name_space)
            .field("grammar", &self.grammar.is_some())
            .finish()
    }
}

type Factory = Box<dyn Fn(&Ticket) -> Result<Box<dyn Filter>> + Send + Sync>;

/// Named filter factories.
#[derive(Default)]
pub struct FilterRegistry {
    factories: AHashMap<String, Factory>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `klass`, replacing any previous one.
    pub fn register<F>(&mut self, klass: &str, factory: F)
    where
        F: Fn(&Ticket) -> Result<Box<dyn Filter>> + Send + Sync + 'static,
    {
        self.factories.insert(klass.to_string(), Box::new(factory));
    }

    pub fn contains(&self, klass: &str) -> bool {
        self.factories.contains_key(klass)
    }

    pub fn create(&self, ticket: &Ticket) -> Result<Box<dyn Filter>> {
        let factory = self
            .factories
            .get(&ticket.klass)
            .ok_or_else(|| Error::UnknownFilter(ticket.klass.clone()))?;
        factory(ticket)
    }
}

/// Filters applied in order.
#[derive(Default)]
pub struct FilterChain {
    stages: Vec<(String, Box<dyn Filter>)>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the schema's filter list. Entries that fail to build are
    /// skipped with a warning.
    pub fn from_schema(
        schema: &SchemaConfig,
        registry: &FilterRegistry,
        grammar: Option<Arc<dyn Grammar>>,
    ) -> Self {
        let mut chain = Self::new();
        for entry in schema.filters() {
            let ticket = Ticket::new(schema, &entry).with_grammar(grammar.clone());
            match registry.create(&ticket) {
                Ok(filter) => {
                    debug!("filter {} ready", entry);
                    chain.push(entry, filter);
                }
                Err(e) => warn!("skipping filter {}: {}", entry, e),
            }
        }
        chain
    }

    pub fn push<S: Into<String>>(&mut self, name: S, filter: Box<dyn Filter>) {
        self.stages.push((name.into(), filter));
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Run `translation` through every stage.
    pub fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        context: Option<&Context>,
    ) -> Box<dyn Translation> {
        self.stages
            .iter_mut()
            .fold(translation, |t, (_, filter)| filter.apply(t, context))
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
