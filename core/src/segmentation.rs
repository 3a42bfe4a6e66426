//! Segments of the input and the segmentation that covers it.
//!
//! A `Segment` is a half-open byte span `[start, end)` of the raw input with a
//! composition status and a menu of candidates answering for that span. A
//! `Segmentation` is the ordered, contiguous cover of the whole input. It grows
//! in rounds: `forward()` opens an empty segment at the current end, segmentors
//! propose spans with `add_segment()`, and `trim()` rolls back speculative
//! spans that are not yet selected.

use std::collections::BTreeSet;
use std::fmt;

use tracing::warn;

use crate::candidate::CandidateRef;
use crate::menu::Menu;

/// Tag attached to a segment whose selection covered only part of its span.
pub const PARTIAL_TAG: &str = "partial";

/// Composition status, ordered from least to most committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SegmentStatus {
    #[default]
    Void,
    Guess,
    Selected,
    Confirmed,
}

#[derive(Debug, Default)]
pub struct Segment {
    pub status: SegmentStatus,
    pub start: usize,
    pub end: usize,
    /// Original span length; `end` may shrink below `start + length` while a
    /// partial selection is closed.
    pub length: usize,
    pub tags: BTreeSet<String>,
    pub menu: Option<Menu>,
    pub selected_index: usize,
    pub prompt: String,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            length: end.saturating_sub(start),
            ..Self::default()
        }
    }

    pub fn with_tag<T: Into<String>>(mut self, tag: T) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Reset to `Void`, dropping tags, menu, selection and prompt.
    pub fn clear(&mut self) {
        self.status = SegmentStatus::Void;
        self.tags.clear();
        self.menu = None;
        self.selected_index = 0;
        self.prompt.clear();
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any_tag_in<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.has_tag(t.as_ref()))
    }

    pub fn get_candidate_at(&self, index: usize) -> Option<&CandidateRef> {
        self.menu.as_ref()?.get_candidate_at(index)
    }

    pub fn get_selected_candidate(&self) -> Option<&CandidateRef> {
        self.get_candidate_at(self.selected_index)
    }

    /// Record the selection of the menu item at `index`.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(menu) = self.menu.as_mut() else {
            return false;
        };
        let Some(wanted) = index.checked_add(1) else {
            return false;
        };
        if menu.prepare(wanted) <= index {
            return false;
        }
        self.selected_index = index;
        self.status = SegmentStatus::Selected;
        true
    }

    /// Finalise the selected candidate into `Confirmed`.
    ///
    /// Selecting a candidate that covers only the head of the span shrinks
    /// the segment to the candidate's end and tags it `partial`.
    pub fn close(&mut self) -> bool {
        let Some(cand_end) = self.get_selected_candidate().map(|c| c.end()) else {
            return false;
        };
        if cand_end > self.start && cand_end < self.end {
            self.end = cand_end;
            self.tags.insert(PARTIAL_TAG.to_string());
        }
        self.status = SegmentStatus::Confirmed;
        true
    }

    /// Re-enter a selected or confirmed segment at `caret_pos`.
    ///
    /// A partial span is restored to its original length and the cached menu
    /// is dropped. With the caret inside `(start, original end]` the segment
    /// goes back to `Guess`, otherwise to `Void`.
    pub fn reopen(&mut self, caret_pos: usize) -> bool {
        if self.status < SegmentStatus::Selected {
            return false;
        }
        let original_end = self.start + self.length;
        if self.end < original_end {
            self.end = original_end;
            self.tags.remove(PARTIAL_TAG);
        }
        self.status = if caret_pos > self.start && caret_pos <= original_end {
            SegmentStatus::Guess
        } else {
            SegmentStatus::Void
        };
        self.menu = None;
        self.selected_index = 0;
        true
    }

    fn is_empty_span(&self) -> bool {
        self.start == self.end
    }
}

/// Ordered cover of the input by segments.
#[derive(Debug, Default)]
pub struct Segmentation {
    input: String,
    segments: Vec<Segment>,
}

impl Segmentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn back(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn back_mut(&mut self) -> Option<&mut Segment> {
        self.segments.last_mut()
    }

    /// Discard every segment and start over on `input`.
    pub fn reset(&mut self, input: &str) {
        self.segments.clear();
        self.input = input.to_string();
    }

    /// Keep only the first `num_segments` segments.
    pub fn reset_to(&mut self, num_segments: usize) {
        if num_segments < self.segments.len() {
            self.segments.truncate(num_segments);
        }
    }

    /// Switch to `new_input`, keeping the segments that lie entirely before
    /// the first byte where old and new input differ.
    pub fn amend(&mut self, new_input: &str) {
        let diff_pos = self
            .input
            .bytes()
            .zip(new_input.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        let mut disposed = 0;
        while self.segments.last().is_some_and(|s| s.end > diff_pos) {
            self.segments.pop();
            disposed += 1;
        }
        self.input = new_input.to_string();
        if disposed > 0 {
            self.forward();
        }
    }

    /// Propose `segment` for the current round.
    ///
    /// The segment must start where the current round starts, which is the end
    /// of the previous segment, and must not run past the input. Within a
    /// round the longer proposal wins; proposals of equal length merge tags.
    pub fn add_segment(&mut self, segment: Segment) -> bool {
        let start = self.current_start_position();
        if segment.start != start || segment.end > self.input.len() || segment.end < segment.start
        {
            warn!(
                "rejected segment [{}, {}) at round start {} (input length {})",
                segment.start,
                segment.end,
                start,
                self.input.len()
            );
            return false;
        }
        match self.segments.last_mut() {
            Some(last) if last.start == start => {
                if last.end < segment.end {
                    *last = segment;
                } else if last.end == segment.end {
                    last.tags.extend(segment.tags);
                }
            }
            _ => self.segments.push(segment),
        }
        true
    }

    /// Open the next round with an empty segment at the current end.
    pub fn forward(&mut self) -> bool {
        match self.segments.last() {
            None => false,
            Some(last) if last.is_empty_span() => false,
            Some(_) if self.has_finished_segmentation() => false,
            Some(last) => {
                let end = last.end;
                self.segments.push(Segment::new(end, end));
                true
            }
        }
    }

    /// Remove the last segment unless it has been selected or confirmed.
    pub fn trim(&mut self) -> bool {
        match self.segments.last() {
            Some(last) if last.status < SegmentStatus::Selected => {
                self.segments.pop();
                true
            }
            _ => false,
        }
    }

    pub fn has_finished_segmentation(&self) -> bool {
        self.current_end_position() >= self.input.len()
    }

    /// Start of the round in progress: the start of an open (empty) trailing
    /// segment, otherwise the end of the last segment.
    pub fn current_start_position(&self) -> usize {
        match self.segments.last() {
            None => 0,
            Some(last) if last.is_empty_span() || last.status == SegmentStatus::Void => {
                last.start
            }
            Some(last) => last.end,
        }
    }

    pub fn current_end_position(&self) -> usize {
        self.segments.last().map_or(0, |s| s.end)
    }

    pub fn current_segment_length(&self) -> usize {
        self.segments.last().map_or(0, |s| s.end - s.start)
    }

    /// End of the leading run of selected or confirmed segments.
    pub fn confirmed_position(&self) -> usize {
        self.segments
            .iter()
            .take_while(|s| s.status >= SegmentStatus::Selected)
            .last()
            .map_or(0, |s| s.end)
    }
}

impl fmt::Display for Segmentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.input)?;
        for seg in &self.segments {
            write!(f, "|{},{}", seg.start, seg.end)?;
            if !seg.tags.is_empty() {
                let tags: Vec<&str> = seg.tags.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", tags.join(","))?;
            }
        }
        write!(f, "]")
    }
}
