//! libopencc
//!
//! Chained dictionary conversion between Chinese variants (OpenCC-style
//! configurations with plain text dictionaries) and the `simplifier` filter
//! built on top of it.
//!
//! Public API:
//! - `TextDict` / `DictGroup` - fst-backed dictionaries behind `Dictionary`
//! - `Converter` - Segmentation plus conversion chain, loaded by `ConverterConfig`
//! - `Opencc` - Lazily loaded, shared engine with word-form and random modes
//! - `OpenccRegistry` - Weak, process-wide engine sharing
//! - `Simplifier` - The candidate filter

pub mod error;
pub use error::{OpenccError, Result};

pub mod dict;
pub use dict::{DictEntry, DictGroup, DictRef, Dictionary, TextDict};

pub mod converter;
pub use converter::{Conversion, ConversionChain, Converter, MaxMatchSegmentation};

pub mod config;
pub use config::ConverterConfig;

pub mod opencc;
pub use opencc::Opencc;

pub mod registry;
pub use registry::OpenccRegistry;

pub mod simplifier;
pub use simplifier::{require_opencc, Simplifier, SimplifierOptions, TipsLevel, SIMPLIFIER};

/// Register this crate's filters.
pub fn register(registry: &mut libime_core::FilterRegistry) {
    registry.register(SIMPLIFIER, Simplifier::create);
}
