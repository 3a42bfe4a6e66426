//! Simplifier filter: converts candidate text through an [`Opencc`] engine.
//!
//! While the controlling option is on, each upstream candidate is replaced
//! by its converted forms as `simplified` shadow candidates. Candidates that
//! fail to convert pass through unchanged.

use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use ahash::AHashSet;
use libime_core::{
    Candidate, CandidateRef, Context, DataDirs, Error as CoreError, Filter, PrefetchTranslation,
    Projection, Ticket, Translation,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{OpenccError, Result};
use crate::opencc::Opencc;
use crate::registry::OpenccRegistry;

pub const SIMPLIFIER: &str = "simplifier";
const DEFAULT_OPENCC_CONFIG: &str = "t2s.json";
const DEFAULT_OPTION_NAME: &str = "simplification";
const QUOTE_LEFT: char = '\u{3014}';
const QUOTE_RIGHT: char = '\u{3015}';

/// When to annotate converted candidates with the alternate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TipsLevel {
    #[default]
    None,
    Char,
    All,
}

impl TipsLevel {
    fn parse(value: &str) -> Self {
        match value {
            "all" => TipsLevel::All,
            "char" => TipsLevel::Char,
            _ => TipsLevel::None,
        }
    }
}

/// Schema options, read from the filter's namespace table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimplifierOptions {
    pub opencc_config: String,
    pub option_name: String,
    #[serde(alias = "tip")]
    pub tips: String,
    pub show_in_comment: bool,
    pub inherit_comment: bool,
    pub comment_format: Vec<String>,
    pub random: bool,
    pub excluded_types: Vec<String>,
}

impl Default for SimplifierOptions {
    fn default() -> Self {
        Self {
            opencc_config: DEFAULT_OPENCC_CONFIG.to_string(),
            option_name: DEFAULT_OPTION_NAME.to_string(),
            tips: String::new(),
            show_in_comment: false,
            inherit_comment: false,
            comment_format: Vec::new(),
            random: false,
            excluded_types: Vec::new(),
        }
    }
}

struct Settings {
    opencc: Arc<Opencc>,
    tips: TipsLevel,
    show_in_comment: bool,
    inherit_comment: bool,
    comment_formatter: Projection,
    random: bool,
    excluded_types: AHashSet<String>,
}

impl Settings {
    /// Push the conversions of `original` onto `result`. Returns false when
    /// nothing was converted.
    fn convert(&self, original: &CandidateRef, result: &mut VecDeque<CandidateRef>) -> bool {
        let text = original.text();
        if text.is_empty() || self.excluded_types.contains(original.kind()) {
            return false;
        }
        if self.random {
            return match self.opencc.random_convert_text(text) {
                Some(converted) => {
                    self.push_back(original, result, &converted);
                    true
                }
                None => false,
            };
        }
        if let Some(forms) = self.opencc.convert_word(text) {
            for form in forms {
                if form == text {
                    result.push_back(Rc::clone(original));
                } else {
                    self.push_back(original, result, &form);
                }
            }
            return true;
        }
        match self.opencc.convert_text(text) {
            Some(converted) => {
                self.push_back(original, result, &converted);
                true
            }
            None => false,
        }
    }

    fn push_back(&self, original: &CandidateRef, result: &mut VecDeque<CandidateRef>, converted: &str) {
        let source = original.text();
        // U+FFFD marks text that did not decode cleanly.
        let show_tips = !source.contains('\u{FFFD}')
            && match self.tips {
                TipsLevel::All => true,
                TipsLevel::Char => source.chars().count() == 1,
                TipsLevel::None => false,
            };
        let mut tips = String::new();
        let text = if self.show_in_comment {
            if show_tips {
                tips = converted.to_string();
                self.comment_formatter.apply(&mut tips);
            }
            source.to_string()
        } else {
            if show_tips {
                tips = source.to_string();
                if !self.comment_formatter.apply(&mut tips) {
                    tips = format!("{QUOTE_LEFT}{source}{QUOTE_RIGHT}");
                }
            }
            converted.to_string()
        };
        result.push_back(Rc::new(Candidate::shadow(
            original,
            "simplified",
            text,
            tips,
            self.inherit_comment,
        )));
    }
}

pub struct Simplifier {
    option_name: String,
    settings: Rc<Settings>,
}

impl Simplifier {
    pub fn new(opencc: Arc<Opencc>, options: &SimplifierOptions) -> Self {
        let comment_formatter = Projection::load(&options.comment_format).unwrap_or_else(|e| {
            warn!("ignoring comment_format: {}", e);
            Projection::new()
        });
        let option_name = if options.option_name.is_empty() {
            DEFAULT_OPTION_NAME.to_string()
        } else {
            options.option_name.clone()
        };
        Self {
            option_name,
            settings: Rc::new(Settings {
                opencc,
                tips: TipsLevel::parse(&options.tips),
                show_in_comment: options.show_in_comment,
                inherit_comment: options.inherit_comment,
                comment_formatter,
                random: options.random,
                excluded_types: options.excluded_types.iter().cloned().collect(),
            }),
        }
    }

    /// Factory used by the filter registry.
    pub fn create(ticket: &Ticket) -> libime_core::Result<Box<dyn Filter>> {
        // Legacy schemas list the component as a bare `filter`.
        let name_space = match ticket.name_space.as_str() {
            "filter" => SIMPLIFIER,
            ns => ns,
        };
        let options: SimplifierOptions = ticket.schema.section(name_space)?;
        let opencc = require_opencc(
            OpenccRegistry::global(),
            &options.opencc_config,
            &ticket.data_dirs,
        )
        .map_err(|e| CoreError::Component {
            name: SIMPLIFIER.to_string(),
            message: e.to_string(),
        })?;
        info!(
            "simplifier [{}] uses {}",
            name_space,
            opencc.config_path().display()
        );
        Ok(Box::new(Self::new(opencc, &options)))
    }

    pub fn option_name(&self) -> &str {
        &self.option_name
    }

    pub fn tips(&self) -> TipsLevel {
        self.settings.tips
    }

    /// Convert one candidate outside of a stream. See [`Filter::apply`].
    pub fn convert(&self, original: &CandidateRef, result: &mut VecDeque<CandidateRef>) -> bool {
        self.settings.convert(original, result)
    }
}

impl Filter for Simplifier {
    fn apply(
        &mut self,
        translation: Box<dyn Translation>,
        context: Option<&Context>,
    ) -> Box<dyn Translation> {
        match context {
            Some(ctx) if ctx.get_option(&self.option_name) => {}
            _ => return translation,
        }
        let settings = Rc::clone(&self.settings);
        Box::new(PrefetchTranslation::new(
            translation,
            move |upstream: &mut dyn Translation, cache: &mut VecDeque<CandidateRef>| {
                // Skip empty slots so no candidate reaches the consumer raw.
                while cache.is_empty() && !upstream.exhausted() {
                    let next = upstream.peek();
                    upstream.next();
                    if let Some(candidate) = next {
                        if !settings.convert(&candidate, cache) {
                            cache.push_back(candidate);
                        }
                    }
                }
                !cache.is_empty()
            },
        ))
    }
}

/// Find or create the engine for `opencc_config`.
///
/// The configured string is the registry key. Relative paths are looked up
/// under `opencc/` in the user data directory, then the shared one; a path
/// found in neither is used as given.
pub fn require_opencc(
    registry: &OpenccRegistry,
    opencc_config: &str,
    data_dirs: &DataDirs,
) -> Result<Arc<Opencc>> {
    let key = if opencc_config.is_empty() {
        DEFAULT_OPENCC_CONFIG
    } else {
        opencc_config
    };
    if let Some(opencc) = registry.get(key) {
        return Ok(opencc);
    }
    let path = Path::new(key);
    if path.extension().is_some_and(|ext| ext == "ini") {
        return Err(OpenccError::LegacyConfig(key.to_string()));
    }
    let resolved = if path.is_relative() {
        data_dirs
            .find("opencc", path)
            .unwrap_or_else(|| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    Ok(registry.get_or_create(key, resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use libime_core::SchemaConfig;

    #[test]
    fn test_tips_level_parse() {
        assert_eq!(TipsLevel::parse("all"), TipsLevel::All);
        assert_eq!(TipsLevel::parse("char"), TipsLevel::Char);
        assert_eq!(TipsLevel::parse("none"), TipsLevel::None);
        assert_eq!(TipsLevel::parse("whatever"), TipsLevel::None);
    }

    #[test]
    fn test_options_defaults_and_tip_alias() {
        let schema = SchemaConfig::from_toml_str("[simplifier]\ntip = \"char\"\n").unwrap();
        let opts: SimplifierOptions = schema.section("simplifier").unwrap();
        assert_eq!(opts.opencc_config, "t2s.json");
        assert_eq!(opts.option_name, "simplification");
        assert_eq!(opts.tips, "char");
        assert!(!opts.random);

        let missing: SimplifierOptions = schema.section("absent").unwrap();
        assert_eq!(missing.opencc_config, "t2s.json");
    }

    #[test]
    fn test_ini_config_rejected() {
        let registry = OpenccRegistry::new();
        let err = require_opencc(&registry, "s2t.ini", &DataDirs::default()).unwrap_err();
        assert!(matches!(err, OpenccError::LegacyConfig(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_relative_config_resolution() {
        let user = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(shared.path().join("opencc")).unwrap();
        std::fs::write(shared.path().join("opencc/s2t.json"), "{}").unwrap();
        let dirs = DataDirs {
            user_data_dir: Some(user.path().to_path_buf()),
            shared_data_dir: Some(shared.path().to_path_buf()),
        };

        let registry = OpenccRegistry::new();
        let opencc = require_opencc(&registry, "s2t.json", &dirs).unwrap();
        assert_eq!(opencc.config_path(), shared.path().join("opencc/s2t.json"));

        let unresolved = require_opencc(&registry, "t2tw.json", &dirs).unwrap();
        assert_eq!(unresolved.config_path(), Path::new("t2tw.json"));
    }

    #[test]
    fn test_registry_key_is_configured_string() {
        let registry = OpenccRegistry::new();
        let a = require_opencc(&registry, "", &DataDirs::default()).unwrap();
        let b = require_opencc(&registry, "t2s.json", &DataDirs::default()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
