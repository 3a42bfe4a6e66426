// tools/src/table.rs
//
// Code table translator for the console.
//
// Table format, one entry per line (blank lines and `#` comments skipped):
//   code<TAB>text[<TAB>weight]
// Whitespace separation is accepted when the line has no tab. A missing or
// unparsable weight reads as 0.
//
// A query for `code` yields, in order:
// 1. exact entries, heaviest first
// 2. completions (longer codes starting with `code`), comment shows the rest
// 3. entries whose code is a proper prefix of `code`, longest first; these
//    cover only the head of the span

use anyhow::{Context as _, Result};
use libime_core::{Candidate, CandidateRef, FifoTranslation, Translation};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;

/// Completions listed per query.
const MAX_COMPLETIONS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub text: String,
    pub weight: f64,
}

#[derive(Debug, Default)]
pub struct CodeTable {
    entries: BTreeMap<String, Vec<TableEntry>>,
}

impl CodeTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("open table {}", path.display()))?;
        let mut table = Self::default();
        for line in BufReader::new(file).lines() {
            table.add_line(&line?);
        }
        Ok(table)
    }

    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();
        content.lines().for_each(|line| table.add_line(line));
        table
    }

    fn add_line(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with('#') {
            return;
        }
        let parts: Vec<&str> = if line.contains('\t') {
            line.split('\t').collect()
        } else {
            line.split_whitespace().collect()
        };
        if parts.len() < 2 || parts[0].is_empty() {
            return;
        }
        let weight = parts
            .get(2)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        self.insert(parts[0], parts[1], weight);
    }

    pub fn insert(&mut self, code: &str, text: &str, weight: f64) {
        let bucket = self.entries.entry(code.to_string()).or_default();
        bucket.push(TableEntry {
            text: text.to_string(),
            weight,
        });
        bucket.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidates for `code`, which starts at byte `offset` of the input.
    pub fn query(&self, code: &str, offset: usize) -> Box<dyn Translation> {
        let mut out = FifoTranslation::new();
        if code.is_empty() {
            return Box::new(out);
        }
        let end = offset + code.len();

        if let Some(bucket) = self.entries.get(code) {
            for entry in bucket {
                out.append(candidate("table", offset, end, entry, ""));
            }
        }

        let completions = self
            .entries
            .range::<str, _>((std::ops::Bound::Excluded(code), std::ops::Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(code))
            .flat_map(|(k, bucket)| bucket.iter().map(move |e| (k, e)))
            .take(MAX_COMPLETIONS);
        for (key, entry) in completions {
            let comment = format!("~{}", &key[code.len()..]);
            out.append(candidate("completion", offset, end, entry, &comment));
        }

        let mut boundaries: Vec<usize> = code.char_indices().map(|(i, _)| i).skip(1).collect();
        boundaries.reverse();
        for len in boundaries {
            if let Some(bucket) = self.entries.get(&code[..len]) {
                for entry in bucket {
                    out.append(candidate("table", offset, offset + len, entry, ""));
                }
            }
        }
        Box::new(out)
    }
}

fn candidate(kind: &str, start: usize, end: usize, entry: &TableEntry, comment: &str) -> CandidateRef {
    Rc::new(Candidate::new(kind, start, end, entry.text.as_str(), entry.weight).with_comment(comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "# demo\nchi\t吃\t2\nchi\t池\t1\nchifan\t吃饭\t3\nfan\t饭\t2\nfan\t反\nfa 发 1.5\n";

    fn texts(mut t: Box<dyn Translation>) -> Vec<(String, String, usize, usize)> {
        let out: Vec<_> = t
            .iter()
            .map(|c| (c.kind().to_string(), c.text().to_string(), c.start(), c.end()))
            .collect();
        out
    }

    #[test]
    fn test_parse_skips_comments() {
        let table = CodeTable::parse(TABLE);
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn test_exact_entries_by_weight() {
        let table = CodeTable::parse(TABLE);
        let out = texts(table.query("fan", 0));
        assert_eq!(out[0].1, "饭");
        assert_eq!(out[1].1, "反");
    }

    #[test]
    fn test_completions_follow_exact() {
        let table = CodeTable::parse(TABLE);
        let mut t = table.query("chi", 0);
        let cands: Vec<_> = t.iter().collect();
        assert_eq!(cands.len(), 3);
        assert_eq!(cands[2].text(), "吃饭");
        assert_eq!(cands[2].kind(), "completion");
        assert_eq!(cands[2].comment(), "~fan");
    }

    #[test]
    fn test_prefix_entries_cover_the_head() {
        let table = CodeTable::parse(TABLE);
        let out = texts(table.query("chiz", 2));
        assert_eq!(out[0], ("table".to_string(), "吃".to_string(), 2, 5));
        assert_eq!(out[1], ("table".to_string(), "池".to_string(), 2, 5));
    }

    #[test]
    fn test_unknown_code_is_empty() {
        let table = CodeTable::parse(TABLE);
        assert!(table.query("zzz", 0).exhausted());
        assert!(table.query("", 0).exhausted());
    }
}
