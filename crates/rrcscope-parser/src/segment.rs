//! Entry segmentation.
//!
//! Splits the line stream of a trace file into one line-group per entry.
//! A blank line only separates entries when the next non-blank line is a
//! timestamp header; some bodies carry an interior blank line (e.g. before a
//! trailing `Log Codes Enabled:` section) that must stay inside the entry.

use std::collections::VecDeque;

use crate::classify::{is_blank, is_timestamp_header};

/// Lazy iterator over the line-groups of a trace
///
/// Single forward pass; not restartable. Only the blank lines of the current
/// lookahead window are buffered beyond the group being built.
#[derive(Debug)]
pub struct EntrySegmenter<I: Iterator<Item = String>> {
    /// Source lines
    lines: I,

    /// Lines pulled during lookahead and not yet processed
    pending: VecDeque<String>,

    /// Still inside the `%` metadata header of the file
    in_header: bool,

    /// Group being accumulated
    current: Vec<String>,

    /// Source exhausted and final group flushed
    finished: bool,
}

/// Segment any sequence of owned lines
pub fn segment_lines<L>(lines: L) -> EntrySegmenter<L::IntoIter>
where
    L: IntoIterator<Item = String>,
{
    EntrySegmenter::new(lines.into_iter())
}

impl<I: Iterator<Item = String>> EntrySegmenter<I> {
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            pending: VecDeque::new(),
            in_header: true,
            current: Vec::new(),
            finished: false,
        }
    }

    fn next_line(&mut self) -> Option<String> {
        self.pending.pop_front().or_else(|| self.lines.next())
    }

    /// Consume the run of blank lines starting at `first_blank`.
    ///
    /// Returns the flushed group when the run is followed by a timestamp
    /// header; otherwise the blanks join the current group (or are dropped at
    /// end of input).
    fn handle_blank_run(&mut self, first_blank: String) -> Option<Vec<String>> {
        let mut blanks = vec![first_blank];
        let next_content = loop {
            match self.next_line() {
                Some(line) if is_blank(&line) => blanks.push(line),
                other => break other,
            }
        };

        match next_content {
            Some(line) if is_timestamp_header(&line) => {
                self.pending.push_back(line);
                if self.current.is_empty() {
                    None
                } else {
                    Some(std::mem::take(&mut self.current))
                }
            }
            Some(line) => {
                // Blanks before the first line of a group are not interior
                if !self.current.is_empty() {
                    self.current.extend(blanks);
                }
                self.pending.push_back(line);
                None
            }
            // Trailing blanks at end of input are not interior content
            None => None,
        }
    }
}

impl<I: Iterator<Item = String>> Iterator for EntrySegmenter<I> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some(line) = self.next_line() {
            if self.in_header {
                if line.starts_with('%') {
                    continue;
                }
                if !is_blank(&line) {
                    self.in_header = false;
                }
            }

            if is_blank(&line) {
                if let Some(group) = self.handle_blank_run(line) {
                    return Some(group);
                }
            } else {
                self.current.push(line);
            }
        }

        self.finished = true;
        if self.current.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.current))
        }
    }
}
