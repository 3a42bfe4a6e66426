//! libime-core
//!
//! Shared pieces for candidate filters: the candidate model and lazy
//! candidate streams, input segmentation, the per-session context, schema
//! configuration and the filter contract implemented by `libopencc` and
//! `libranking`.
//!
//! Public API:
//! - `Candidate` - Ranked text candidate, possibly shadowing another
//! - `Translation` - Lazy, peekable candidate stream
//! - `Segmentation` - Partition of the raw input into segments
//! - `Context` - Session state read by filters
//! - `Filter` / `FilterChain` - Stream transformations and their composition
//! - `SchemaConfig` - TOML schema with per-filter namespaces

pub mod candidate;
pub use candidate::{Candidate, CandidateRef};

pub mod translation;
pub use translation::{
    FifoTranslation, PrefetchTranslation, Replenish, Translation, TranslationIter,
    UnionTranslation,
};

pub mod menu;
pub use menu::Menu;

pub mod segmentation;
pub use segmentation::{Segment, SegmentStatus, Segmentation, PARTIAL_TAG};

pub mod context;
pub use context::{CommitHistory, CommitRecord, Context, COMMIT_HISTORY_CAPACITY};

pub mod grammar;
pub use grammar::Grammar;

pub mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{DataDirs, SchemaConfig};

pub mod projection;
pub use projection::Projection;

pub mod filter;
pub use filter::{Filter, FilterChain, FilterRegistry, Ticket};
