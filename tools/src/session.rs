// tools/src/session.rs
//
// Console session: a context, a filter chain and a code table driven by
// text commands.
//
// Commands:
//   print candidate list          all candidates of the current segment
//   select candidate N            pick the N-th (1-based) candidate
//   set option [!]NAME            switch a context option on (off with `!`)
//   set context LEFT | RIGHT      host text around the caret
//   clear context                 forget host text and auto context
//   show context                  print the context state
//   auto context on|off           feed commits back as preceding text
//   anything else                 replace the input and show the first page

use libime_core::{Context, FilterChain, Menu, Segment, SegmentStatus};
use tracing::debug;

use crate::table::CodeTable;

/// Upper bound for `print candidate list`.
const MAX_LISTED: usize = 100;
/// Bytes of committed text kept as preceding text in auto context mode.
const AUTO_CONTEXT_BYTES: usize = 30;

pub struct Session {
    table: CodeTable,
    chain: FilterChain,
    context: Context,
    page_size: usize,
    auto_context: bool,
    accumulated: String,
}

impl Session {
    pub fn new(table: CodeTable, chain: FilterChain, page_size: usize) -> Self {
        Self {
            table,
            chain,
            context: Context::new(),
            page_size: page_size.max(1),
            auto_context: false,
            accumulated: String::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Run one command line and return the lines to print.
    pub fn execute(&mut self, line: &str) -> Vec<String> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }
        if line == "print candidate list" {
            return self.list_candidates(MAX_LISTED);
        }
        if let Some(arg) = line.strip_prefix("select candidate ") {
            return match arg.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.select(n - 1),
                _ => vec![format!("bad candidate number: {}", arg.trim())],
            };
        }
        if let Some(arg) = line.strip_prefix("set option ") {
            let arg = arg.trim();
            let (name, value) = match arg.strip_prefix('!') {
                Some(name) => (name, false),
                None => (arg, true),
            };
            self.context.set_option(name, value);
            return vec![format!("{} set {}.", name, if value { "on" } else { "off" })];
        }
        if let Some(arg) = line.strip_prefix("set context ") {
            let (left, right) = arg.split_once('|').unwrap_or((arg, ""));
            self.context.set_context_text(left.trim(), right.trim());
            return vec![format!(
                "context set: left={:?} right={:?}",
                self.context.external_preceding_text(),
                self.context.external_following_text()
            )];
        }
        match line {
            "clear context" => {
                self.context.clear_context_text();
                self.accumulated.clear();
                return vec!["context cleared.".to_string()];
            }
            "show context" => return self.show_context(),
            "auto context on" | "auto context off" => {
                self.auto_context = line.ends_with("on");
                return vec![format!(
                    "auto context {}.",
                    if self.auto_context { "ON" } else { "OFF" }
                )];
            }
            _ => {}
        }
        self.compose(line)
    }

    fn compose(&mut self, input: &str) -> Vec<String> {
        self.context.set_input(input);
        self.context.segmentation_mut().reset(input);
        self.translate_current();
        self.list_candidates(self.page_size)
    }

    /// Open a segment from the current round start to the end of the input
    /// and attach the filtered table candidates.
    fn translate_current(&mut self) {
        let input = self.context.input().to_string();
        let start = self.context.segmentation().current_start_position();
        let segment = Segment::new(start, input.len()).with_tag("abc");
        if !self.context.segmentation_mut().add_segment(segment) {
            return;
        }
        let translation = self.table.query(&input[start..], start);
        let filtered = self.chain.apply(translation, Some(&self.context));
        if let Some(segment) = self.context.segmentation_mut().back_mut() {
            segment.status = SegmentStatus::Guess;
            segment.menu = Some(Menu::from_translation(filtered));
        }
    }

    fn list_candidates(&mut self, count: usize) -> Vec<String> {
        let input = self.context.input().to_string();
        let Some(segment) = self.context.segmentation_mut().back_mut() else {
            return vec!["no composition.".to_string()];
        };
        let Some(menu) = segment.menu.as_mut() else {
            return vec!["no composition.".to_string()];
        };
        let available = menu.prepare(count);
        let mut lines = vec![format!(
            "input: {} [{}, {})",
            input, segment.start, segment.end
        )];
        if available == 0 {
            lines.push("(no candidates)".to_string());
        }
        for (i, cand) in menu.candidates().iter().take(count).enumerate() {
            let mut line = format!("{}. {}", i + 1, cand.text());
            if !cand.comment().is_empty() {
                line.push_str(&format!(" {}", cand.comment()));
            }
            line.push_str(&format!(
                "  ({} [{}, {}) q={:.3})",
                cand.kind(),
                cand.start(),
                cand.end(),
                cand.quality()
            ));
            lines.push(line);
        }
        lines
    }

    fn select(&mut self, index: usize) -> Vec<String> {
        let segmentation = self.context.segmentation_mut();
        let Some(segment) = segmentation.back_mut() else {
            return vec!["no composition.".to_string()];
        };
        if !segment.select(index) {
            return vec![format!("no candidate #{}.", index + 1)];
        }
        segment.close();
        if segmentation.forward() {
            self.translate_current();
            return self.list_candidates(self.page_size);
        }
        self.commit()
    }

    fn commit(&mut self) -> Vec<String> {
        let segments = self.context.segmentation().segments();
        let text: String = segments
            .iter()
            .filter_map(|s| s.get_selected_candidate())
            .map(|c| c.text())
            .collect();
        let kind = segments
            .last()
            .and_then(|s| s.get_selected_candidate())
            .map_or("table".to_string(), |c| c.kind().to_string());
        debug!("commit {:?} ({})", text, kind);
        self.context.commit(kind, text.as_str());
        if self.auto_context {
            self.accumulated.push_str(&text);
            let mut cut = self.accumulated.len().saturating_sub(AUTO_CONTEXT_BYTES);
            while !self.accumulated.is_char_boundary(cut) {
                cut += 1;
            }
            self.accumulated.drain(..cut);
            let following = self.context.external_following_text().to_string();
            self.context
                .set_context_text(self.accumulated.as_str(), following);
        }
        vec![format!("commit: {}", text)]
    }

    fn show_context(&self) -> Vec<String> {
        let ctx = &self.context;
        let mut lines = vec![
            format!("left: {:?}", ctx.external_preceding_text()),
            format!("right: {:?}", ctx.external_following_text()),
            format!("last commit: {:?}", ctx.internal_preceding_text()),
            format!("auto context: {}", if self.auto_context { "ON" } else { "OFF" }),
        ];
        if self.auto_context {
            lines.push(format!("accumulated: {:?}", self.accumulated));
        }
        lines.push(format!("filters: {:?}", self.chain.names()));
        lines
    }
}
