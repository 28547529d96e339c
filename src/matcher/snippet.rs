//! Source Text & Snippet Rendering
//!
//! Line-indexed view over one file's content, shared by both match
//! backends. Snippets render the matched range plus one line of context
//! either side, capped at the snippet line limit; match lines are
//! prefixed `>` and context lines with a space, followed by the 1-based
//! line number right-padded to four columns.

use crate::constants::matcher::{
    MAX_SNIPPET_LINES, NEGATIVE_WINDOW_AFTER, NEGATIVE_WINDOW_BEFORE, SNIPPET_CONTEXT_LINES,
    SNIPPET_LINE_NO_WIDTH,
};

/// One file's content with precomputed line-start offsets.
pub(crate) struct SourceText<'a> {
    text: &'a str,
    /// Byte offset where each line begins
    line_starts: Vec<usize>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0usize];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 0-based line content, without the trailing newline.
    pub fn line(&self, idx: usize) -> &'a str {
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        &self.text[start..end]
    }

    /// Byte offset at which a 0-based line begins.
    pub fn line_start_offset(&self, idx: usize) -> usize {
        self.line_starts[idx]
    }

    /// (0-based line, 0-based byte column) of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32, column as u32)
    }

    /// Render a snippet for a 1-based line range.
    pub fn snippet(&self, line_start: u32, line_end: u32) -> String {
        let match_first = line_start.saturating_sub(1) as usize;
        let match_last = (line_end.saturating_sub(1) as usize).min(self.line_count() - 1);

        let window_first = match_first.saturating_sub(SNIPPET_CONTEXT_LINES);
        let window_last = (match_last + SNIPPET_CONTEXT_LINES).min(self.line_count() - 1);

        let mut rendered = Vec::new();
        for idx in window_first..=window_last {
            if rendered.len() >= MAX_SNIPPET_LINES {
                break;
            }
            let prefix = if idx >= match_first && idx <= match_last {
                '>'
            } else {
                ' '
            };
            rendered.push(format!(
                "{}{:<width$} {}",
                prefix,
                idx + 1,
                self.line(idx),
                width = SNIPPET_LINE_NO_WIDTH
            ));
        }
        rendered.join("\n")
    }

    /// Context window used by the negative-pattern filter:
    /// lines `[max(0, line_start - 3), min(line_count, line_end + 2))`,
    /// 0-based with an exclusive end, joined with newlines.
    pub fn negative_window(&self, line_start: u32, line_end: u32) -> String {
        let first = line_start.saturating_sub(NEGATIVE_WINDOW_BEFORE) as usize;
        let end = ((line_end + NEGATIVE_WINDOW_AFTER) as usize).min(self.line_count());
        (first..end)
            .map(|idx| self.line(idx))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "line one\nline two\nline three\nline four\nline five";

    #[test]
    fn test_line_count_and_access() {
        let source = SourceText::new(SAMPLE);
        assert_eq!(source.line_count(), 5);
        assert_eq!(source.line(0), "line one");
        assert_eq!(source.line(4), "line five");
    }

    #[test]
    fn test_trailing_newline() {
        let source = SourceText::new("a\nb\n");
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.line(1), "b");
        assert_eq!(source.line(2), "");
    }

    #[test]
    fn test_position() {
        let source = SourceText::new(SAMPLE);
        assert_eq!(source.position(0), (0, 0));
        assert_eq!(source.position(5), (0, 5));
        // "line two" starts at offset 9
        assert_eq!(source.position(9), (1, 0));
        assert_eq!(source.position(14), (1, 5));
    }

    #[test]
    fn test_snippet_marks_match_line() {
        let source = SourceText::new(SAMPLE);
        let snippet = source.snippet(3, 3);
        let lines: Vec<&str> = snippet.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], " 2    line two");
        assert_eq!(lines[1], ">3    line three");
        assert_eq!(lines[2], " 4    line four");
    }

    #[test]
    fn test_snippet_at_file_start() {
        let source = SourceText::new(SAMPLE);
        let snippet = source.snippet(1, 1);
        let lines: Vec<&str> = snippet.lines().collect();
        assert_eq!(lines[0], ">1    line one");
        assert_eq!(lines[1], " 2    line two");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_snippet_capped_at_limit() {
        let text = (1..=10)
            .map(|i| format!("l{}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let source = SourceText::new(&text);
        let snippet = source.snippet(2, 9);
        assert_eq!(snippet.lines().count(), MAX_SNIPPET_LINES);
        // Window starts one line before the match.
        assert!(snippet.starts_with(" 1    l1"));
    }

    #[test]
    fn test_negative_window_bounds() {
        let source = SourceText::new(SAMPLE);
        // Match on line 3: window covers lines 1..5 (0-based [0, 5)).
        let window = source.negative_window(3, 3);
        assert_eq!(window.lines().count(), 5);

        // Match on line 1: window clamps at the file start.
        let window = source.negative_window(1, 1);
        assert!(window.starts_with("line one"));
        assert_eq!(window.lines().count(), 3);

        // Match on the last line: window clamps at the file end.
        let window = source.negative_window(5, 5);
        assert!(window.ends_with("line five"));
        assert_eq!(window.lines().count(), 3);
    }
}
