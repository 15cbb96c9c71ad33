//! Line-oriented scanning: splits source into logical lines carrying
//! byte offsets, and strips trailing `#` comments without being fooled
//! by a `#` inside a quoted scalar.

use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    pub indent: usize,
    /// Byte range of the line's content in the source, with
    /// indentation, trailing comment, and trailing whitespace excluded.
    pub content: Span,
    pub comment: Option<Span>,
}

impl RawLine {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.content.clone()]
    }

    pub fn is_blank(&self, source: &str) -> bool {
        self.text(source).is_empty()
    }

    pub fn is_document_marker(&self, source: &str) -> bool {
        matches!(self.text(source), "---" | "...")
    }
}

pub fn split_lines(source: &str) -> Vec<RawLine> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    for raw in source.split_inclusive('\n') {
        let without_newline = raw.strip_suffix('\n').unwrap_or(raw);
        let line = without_newline.strip_suffix('\r').unwrap_or(without_newline);
        let indent = line.len() - line.trim_start().len();
        let (before_comment, comment) = split_comment(line, offset);
        let start = offset + indent;
        let trimmed_len = before_comment[indent.min(before_comment.len())..].trim_end().len();
        out.push(RawLine {
            indent,
            content: start..(start + trimmed_len),
            comment,
        });
        offset += raw.len();
    }
    out
}

fn split_comment(line: &str, line_offset: usize) -> (&str, Option<Span>) {
    let bytes = line.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'#' if !in_single && !in_double && (i == 0 || bytes[i - 1].is_ascii_whitespace()) => {
                return (&line[..i], Some((line_offset + i)..(line_offset + line.len())));
            }
            _ => {}
        }
        i += 1;
    }
    (line, None)
}

/// Locates the colon separating a mapping key from its value on a
/// single logical line, ignoring colons inside quotes or flow
/// collections. Returns the byte offset of the colon within `text`.
pub fn find_key_colon(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'[' | b'{' if !in_single && !in_double => depth += 1,
            b']' | b'}' if !in_single && !in_double => depth -= 1,
            b':' if !in_single && !in_double && depth == 0 => {
                let next_is_boundary = i + 1 == bytes.len() || bytes[i + 1].is_ascii_whitespace();
                if next_is_boundary {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_comment_outside_quotes() {
        let source = "image: nginx # pin this\n";
        let lines = split_lines(source);
        assert_eq!(lines[0].text(source), "image: nginx");
        assert!(lines[0].comment.is_some());
    }

    #[test]
    fn keeps_hash_inside_quoted_scalar() {
        let source = "command: \"echo #not-a-comment\"\n";
        let lines = split_lines(source);
        assert_eq!(lines[0].text(source), "command: \"echo #not-a-comment\"");
        assert!(lines[0].comment.is_none());
    }

    #[test]
    fn finds_key_colon_ignoring_flow_collections() {
        let colon = find_key_colon("ports: [\"80:80\"]").unwrap();
        assert_eq!(&"ports: [\"80:80\"]"[..colon], "ports");
    }
}
