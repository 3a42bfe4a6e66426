//! Text projections used to format candidate comments.
//!
//! A projection is an ordered list of formulas. The operator name is followed
//! by a separator character of the author's choice, which then delimits the
//! arguments:
//!
//! - `xform/pattern/replacement/`: regex replace (all matches, `$1` groups)
//! - `xlit/abc/xyz/`: per-character transliteration
//! - `erase/pattern/`: clear the text when the pattern matches all of it

use ahash::AHashMap;
use regex::Regex;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
enum Calculation {
    Transform { pattern: Regex, replacement: String },
    Transliterate { map: AHashMap<char, char> },
    Erase { pattern: Regex },
}

impl Calculation {
    fn parse(formula: &str) -> Result<Self> {
        let invalid = |message: &str| Error::Projection {
            formula: formula.to_string(),
            message: message.to_string(),
        };
        let op_len = formula
            .find(|c: char| !c.is_ascii_lowercase())
            .ok_or_else(|| invalid("missing separator"))?;
        let (op, rest) = formula.split_at(op_len);
        let sep = rest.chars().next().ok_or_else(|| invalid("missing separator"))?;
        let args: Vec<&str> = rest[sep.len_utf8()..].split(sep).collect();
        let regex = |pattern: &str| {
            Regex::new(pattern).map_err(|e| invalid(&e.to_string()))
        };

        match op {
            "xform" if args.len() >= 2 => Ok(Calculation::Transform {
                pattern: regex(args[0])?,
                replacement: args[1].to_string(),
            }),
            "xlit" if args.len() >= 2 => {
                let left: Vec<char> = args[0].chars().collect();
                let right: Vec<char> = args[1].chars().collect();
                if left.len() != right.len() {
                    return Err(invalid("xlit sides differ in length"));
                }
                Ok(Calculation::Transliterate {
                    map: left.into_iter().zip(right).collect(),
                })
            }
            "erase" if !args.is_empty() => {
                // Anchor so that only a whole-text match erases.
                Ok(Calculation::Erase {
                    pattern: regex(&format!("^(?:{})$", args[0]))?,
                })
            }
            "xform" | "xlit" | "erase" => Err(invalid("missing arguments")),
            _ => Err(invalid("unknown operator")),
        }
    }

    fn apply(&self, text: &mut String) -> bool {
        match self {
            Calculation::Transform {
                pattern,
                replacement,
            } => {
                let replaced = pattern.replace_all(text.as_str(), replacement.as_str());
                if replaced == *text {
                    return false;
                }
                *text = replaced.into_owned();
                true
            }
            Calculation::Transliterate { map } => {
                let mut modified = false;
                let converted: String = text
                    .chars()
                    .map(|c| match map.get(&c) {
                        Some(&to) => {
                            modified |= to != c;
                            to
                        }
                        None => c,
                    })
                    .collect();
                if modified {
                    *text = converted;
                }
                modified
            }
            Calculation::Erase { pattern } => {
                if text.is_empty() || !pattern.is_match(text) {
                    return false;
                }
                text.clear();
                true
            }
        }
    }
}

/// An ordered list of text calculations.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    calculation: Vec<Calculation>,
}

impl Projection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every formula; the first invalid one fails the whole load.
    pub fn load<S: AsRef<str>>(formulas: &[S]) -> Result<Self> {
        let calculation = formulas
            .iter()
            .map(|f| Calculation::parse(f.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { calculation })
    }

    pub fn is_empty(&self) -> bool {
        self.calculation.is_empty()
    }

    /// Run all formulas over `text`. Returns whether anything changed.
    pub fn apply(&self, text: &mut String) -> bool {
        let mut modified = false;
        for calc in &self.calculation {
            modified |= calc.apply(text);
        }
        modified
    }
}
