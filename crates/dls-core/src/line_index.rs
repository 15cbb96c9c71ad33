//! Byte-offset to LSP `Position` conversion, shared by the HCL and YAML
//! analyzers, a single reusable converter instead of duplicating the
//! arithmetic in both.
//!
//! LSP positions are UTF-16 code units per the protocol; documents are
//! stored as UTF-8, so every conversion walks the line's `chars()` once.

use lsp_types::{Position, Range};

#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    fn line_of_offset(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        }
    }

    pub fn offset_to_position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_of_offset(offset);
        let line_start = self.line_starts[line];
        let line_text = &text[line_start..offset];
        let character = line_text.chars().map(char::len_utf16).sum::<usize>() as u32;
        Position {
            line: line as u32,
            character,
        }
    }

    pub fn position_to_offset(&self, text: &str, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.len;
        }
        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.len);
        let line_text = &text[line_start..line_end];

        let mut units_remaining = position.character;
        let mut offset = line_start;
        for ch in line_text.chars() {
            if units_remaining == 0 {
                break;
            }
            let units = ch.len_utf16() as u32;
            if units > units_remaining {
                break;
            }
            units_remaining -= units;
            offset += ch.len_utf8();
        }
        offset
    }

    pub fn range(&self, text: &str, span: std::ops::Range<usize>) -> Range {
        Range {
            start: self.offset_to_position(text, span.start),
            end: self.offset_to_position(text, span.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trip() {
        let text = "target \"a\" {\n  context = \".\"\n}\n";
        let index = LineIndex::new(text);
        let pos = index.offset_to_position(text, 15);
        assert_eq!(pos, Position { line: 1, character: 2 });
        assert_eq!(index.position_to_offset(text, pos), 15);
    }

    #[test]
    fn multibyte_characters_count_utf16_units() {
        let text = "# caf\u{e9} target\ntarget \"t\" {}\n";
        let index = LineIndex::new(text);
        let offset = text.find("target").unwrap();
        let pos = index.offset_to_position(text, offset);
        assert_eq!(pos.line, 0);
        assert_eq!(index.position_to_offset(text, pos), offset);
    }
}
