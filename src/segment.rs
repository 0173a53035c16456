use std::io::{BufRead, Lines};
use std::mem;

use crate::errors::Error;

/// Splits raw bibliography text into per-entry blocks.
///
/// The fold works line by line on trimmed input. `%` lines vanish even
/// inside an entry body. An `@` line closes the previous accumulation
/// (flushing it when balanced, discarding it when not) and opens a new
/// one. Everything else is appended while a brace counter tracks
/// nesting; the accumulation is complete once the counter returns to
/// zero. Lines outside any entry are ignored, so prose between entries
/// is harmless.
#[derive(Debug, Default)]
pub(crate) struct SegmentState {
    accumulated: String,
    brace_depth: i32,
    in_entry: bool,
    unterminated: usize,
}

impl SegmentState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw line, returning a completed entry block if this
    /// line finished one.
    pub(crate) fn push_line(&mut self, raw_line: &str) -> Option<String> {
        let line = raw_line.trim();
        if line.starts_with('%') {
            // Comment lines do not count toward brace depth either.
            return None;
        }
        if line.starts_with('@') {
            let mut flushed = None;
            if self.in_entry {
                if self.brace_depth == 0 && !self.accumulated.is_empty() {
                    flushed = Some(mem::take(&mut self.accumulated));
                } else if self.brace_depth > 0 {
                    log::debug!(
                        "discarding unterminated entry ({} open braces): {:.40}...",
                        self.brace_depth,
                        self.accumulated
                    );
                    self.unterminated += 1;
                }
            }
            self.accumulated.clear();
            self.accumulated.push_str(line);
            self.in_entry = true;
            // Only opening braces count on the marker line; the field
            // lines that follow balance against them.
            self.brace_depth = line.bytes().filter(|&byte| byte == b'{').count() as i32;
            return flushed;
        }
        if !self.in_entry {
            return None;
        }
        self.accumulated.push('\n');
        self.accumulated.push_str(line);
        for byte in line.bytes() {
            match byte {
                b'{' => self.brace_depth += 1,
                b'}' => self.brace_depth -= 1,
                _ => {}
            }
        }
        if self.brace_depth == 0 && self.accumulated.contains('{') {
            self.in_entry = false;
            return Some(mem::take(&mut self.accumulated));
        }
        None
    }

    /// Flushes a balanced trailing accumulation at end of input; an
    /// unbalanced one is dropped.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.in_entry
            && self.brace_depth == 0
            && !self.accumulated.is_empty()
            && self.accumulated.contains('{')
        {
            self.in_entry = false;
            return Some(mem::take(&mut self.accumulated));
        }
        if self.in_entry {
            log::debug!("discarding unterminated entry at end of input");
            self.unterminated += 1;
            self.in_entry = false;
            self.accumulated.clear();
        }
        None
    }

    pub(crate) fn unterminated(&self) -> usize {
        self.unterminated
    }
}

// Streaming segmentation over any buffered reader. Read failures are the
// one thing that surfaces as an error; afterwards the iterator is done.
pub(crate) struct Segments<R> {
    lines: Lines<R>,
    state: SegmentState,
    done: bool,
}

impl<R: BufRead> Segments<R> {
    pub(crate) fn new(reader: R) -> Self {
        Segments {
            lines: reader.lines(),
            state: SegmentState::new(),
            done: false,
        }
    }

    pub(crate) fn unterminated(&self) -> usize {
        self.state.unterminated()
    }
}

impl<R: BufRead> Iterator for Segments<R> {
    type Item = Result<String, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    if let Some(block) = self.state.push_line(&line) {
                        return Some(Ok(block));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(Error::Io(err)));
                }
                None => {
                    self.done = true;
                    return self.state.finish().map(Ok);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(input: &str) -> Vec<String> {
        let mut state = SegmentState::new();
        let mut out: Vec<String> = input.lines().filter_map(|l| state.push_line(l)).collect();
        out.extend(state.finish());
        out
    }

    #[test]
    fn test_single_entry() {
        let out = blocks("@article{key2020,\n  title = {Things},\n}\n");
        assert_eq!(out, vec!["@article{key2020,\ntitle = {Things},\n}"]);
    }

    #[test]
    fn test_concatenated_entries_without_blank_line() {
        let input = "@article{a,\ntitle={X}\n}\n@book{b,\ntitle={Y}\n}";
        let out = blocks(input);
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("@article{a,"));
        assert!(out[1].starts_with("@book{b,"));
    }

    #[test]
    fn test_comment_lines_vanish_inside_entries() {
        // The stray openers would push the depth out of balance if the
        // comment line were counted.
        let input = "@misc{k,\n% stray { { openers\nnote={n}\n}";
        let out = blocks(input);
        assert_eq!(out, vec!["@misc{k,\nnote={n}\n}"]);
    }

    #[test]
    fn test_prose_only_input_yields_nothing() {
        let out = blocks("This file has no entries.\nJust prose, braces like {} included?\n");
        assert!(out.is_empty());
    }

    #[test]
    fn test_unterminated_trailing_entry_is_dropped() {
        let mut state = SegmentState::new();
        for line in ["@article{a,", "title = {never closed"] {
            assert_eq!(state.push_line(line), None);
        }
        assert_eq!(state.finish(), None);
        assert_eq!(state.unterminated(), 1);
    }

    #[test]
    fn test_new_marker_discards_open_accumulation() {
        let mut state = SegmentState::new();
        let mut out = Vec::new();
        for line in ["@a{x,", "title={y", "@b{z,", "note={n}", "}"] {
            out.extend(state.push_line(line));
        }
        out.extend(state.finish());
        assert_eq!(out, vec!["@b{z,\nnote={n}\n}"]);
        assert_eq!(state.unterminated(), 1);
    }

    #[test]
    fn test_braceless_marker_line_flushes_on_next_marker() {
        let out = blocks("@comment this shelf is sorted by hand\n@misc{m,\nnote={x}\n}");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "@comment this shelf is sorted by hand");
        assert!(out[1].starts_with("@misc{m,"));
    }

    #[test]
    fn test_blank_lines_between_entries() {
        let input = "@misc{a,\nnote={1}\n}\n\n\n@misc{b,\nnote={2}\n}\n";
        assert_eq!(blocks(input).len(), 2);
    }

    #[test]
    fn test_lines_are_trimmed_into_the_block() {
        let out = blocks("   @misc{pad,\n     note = {x}   \n   }");
        assert_eq!(out, vec!["@misc{pad,\nnote = {x}\n}"]);
    }

    #[test]
    fn test_streaming_matches_state_fold() {
        let input = "@article{a,\ntitle={X}\n}\n@book{b,\ntitle={Y}\n}";
        let streamed: Vec<String> = Segments::new(std::io::Cursor::new(input))
            .map(|block| block.unwrap())
            .collect();
        assert_eq!(streamed, blocks(input));
    }
}
