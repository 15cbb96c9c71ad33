//! Indentation-driven recursive descent over the YAML subset Compose
//! files actually use: block and flow mappings/sequences, plain/quoted
//! scalars, line comments, and anchors/aliases. Multi-document streams
//! (`---`/`...`) are treated as noise around a single document.

use std::ops::Range;

use rustc_hash::FxHashMap;

use crate::ir::{Alias, AnchorDef, Mapping, MappingEntry, Node, Scalar, Sequence, Span, YamlDocument};
use crate::lexer::{find_key_colon, split_lines, RawLine};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

pub fn parse(source: &str) -> (YamlDocument, Vec<ParseError>) {
    let lines = split_lines(source);
    let mut parser = Parser {
        source,
        lines,
        pos: 0,
        anchors: FxHashMap::default(),
        aliases: Vec::new(),
        errors: Vec::new(),
    };
    parser.skip_noise();
    let root = parser.current().cloned().map(|line| parser.parse_node(line.indent));
    (
        YamlDocument { root, anchors: parser.anchors, aliases: parser.aliases },
        parser.errors,
    )
}

struct Parser<'a> {
    source: &'a str,
    lines: Vec<RawLine>,
    pos: usize,
    anchors: FxHashMap<String, AnchorDef>,
    aliases: Vec<Alias>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&RawLine> {
        self.lines.get(self.pos)
    }

    fn skip_noise(&mut self) {
        while let Some(line) = self.lines.get(self.pos) {
            if line.is_blank(self.source) || line.is_document_marker(self.source) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn parse_node(&mut self, indent: usize) -> Node {
        self.skip_noise();
        let Some(line) = self.current().cloned() else {
            return empty_scalar(self.source.len());
        };
        if line.indent != indent {
            return empty_scalar(line.content.start);
        }
        let text = line.text(self.source);
        if text == "-" || text.starts_with("- ") {
            self.parse_sequence(indent)
        } else {
            self.parse_mapping(indent)
        }
    }

    fn parse_mapping(&mut self, indent: usize) -> Node {
        let start = self.current().map(|l| l.content.start).unwrap_or(self.source.len());
        let mut entries = Vec::new();
        self.continue_mapping(indent, &mut entries);
        let end = entries.last().map(|e| e.span.end).unwrap_or(start);
        Node::Mapping(Mapping { entries, anchor: None, span: start..end })
    }

    /// Consumes further lines at exactly `indent` as mapping entries,
    /// stopping at a shallower/deeper line or a sequence dash.
    fn continue_mapping(&mut self, indent: usize, entries: &mut Vec<MappingEntry>) {
        loop {
            self.skip_noise();
            let Some(line) = self.current().cloned() else { break };
            if line.indent != indent {
                break;
            }
            let text = line.text(self.source);
            if text == "-" || text.starts_with("- ") {
                break;
            }
            entries.push(self.parse_mapping_entry(indent));
        }
    }

    fn parse_mapping_entry(&mut self, indent: usize) -> MappingEntry {
        let line = self.lines[self.pos].clone();
        let text = line.text(self.source).to_string();
        let content_start = line.content.start;
        self.pos += 1;

        let Some(colon) = find_key_colon(&text) else {
            let key_text = text.trim();
            let key_span = content_start..(content_start + text.len());
            self.errors.push(ParseError {
                message: "expected ':' in mapping entry".to_string(),
                span: key_span.clone(),
            });
            let key = self.make_key_scalar(key_text, key_span.clone());
            return MappingEntry { key, value: empty_scalar(key_span.end), span: key_span };
        };

        let key_raw = &text[..colon];
        let key_trimmed = key_raw.trim();
        let key_offset = content_start + (key_raw.len() - key_raw.trim_start().len());
        let key_span = key_offset..(key_offset + key_trimmed.len());
        let key = self.make_key_scalar(key_trimmed, key_span.clone());

        let rest_raw = &text[colon + 1..];
        let rest = rest_raw.trim();
        let rest_offset = content_start + colon + 1 + (rest_raw.len() - rest_raw.trim_start().len());

        let value = if rest.is_empty() {
            self.parse_value_block(indent, rest_offset)
        } else if rest.starts_with('&') && !rest.contains(char::is_whitespace) {
            let name = rest[1..].to_string();
            let mut node = self.parse_value_block(indent, rest_offset + rest.len());
            attach_anchor(&mut node, &name);
            self.anchors.insert(
                name,
                AnchorDef { name_span: rest_offset..(rest_offset + rest.len()), node: node.clone() },
            );
            node
        } else {
            self.parse_inline_value(rest, rest_offset)
        };
        let span = key_span.start..value.span().end;
        MappingEntry { key, value, span }
    }

    /// The value of a `key:` line with nothing after the colon: either a
    /// nested, more-indented block, or an empty (null) scalar.
    fn parse_value_block(&mut self, parent_indent: usize, fallback_offset: usize) -> Node {
        self.skip_noise();
        match self.current() {
            Some(line) if line.indent > parent_indent => {
                let child_indent = line.indent;
                self.parse_node(child_indent)
            }
            _ => empty_scalar(fallback_offset),
        }
    }

    fn parse_sequence(&mut self, indent: usize) -> Node {
        let start = self.current().map(|l| l.content.start).unwrap_or(self.source.len());
        let mut items = Vec::new();
        let mut end = start;
        loop {
            self.skip_noise();
            let Some(line) = self.current().cloned() else { break };
            if line.indent != indent {
                break;
            }
            let text = line.text(self.source).to_string();
            if !(text == "-" || text.starts_with("- ")) {
                break;
            }
            self.pos += 1;
            let dash_start = line.content.start;

            let item = if text == "-" {
                self.parse_value_block(indent, dash_start + 1)
            } else {
                let after = &text[2..];
                let after_trimmed = after.trim_start();
                let after_start = dash_start + 2 + (after.len() - after_trimmed.len());
                if after_trimmed.is_empty() {
                    self.parse_value_block(indent, dash_start + text.len())
                } else if let Some(colon) = find_key_colon(after_trimmed) {
                    let inline_indent = line.indent + 2 + (after.len() - after_trimmed.len());
                    self.parse_dash_mapping(inline_indent, after_trimmed, after_start, colon)
                } else {
                    self.parse_inline_value(after_trimmed, after_start)
                }
            };
            end = item.span().end;
            items.push(item);
        }
        Node::Sequence(Sequence { items, anchor: None, span: start..end.max(start) })
    }

    fn parse_dash_mapping(&mut self, inline_indent: usize, first_text: &str, first_start: usize, colon: usize) -> Node {
        let key_raw = &first_text[..colon];
        let key_trimmed = key_raw.trim();
        let key_offset = first_start + (key_raw.len() - key_raw.trim_start().len());
        let key_span = key_offset..(key_offset + key_trimmed.len());
        let key = self.make_key_scalar(key_trimmed, key_span.clone());

        let rest_raw = &first_text[colon + 1..];
        let rest = rest_raw.trim();
        let rest_offset = first_start + colon + 1 + (rest_raw.len() - rest_raw.trim_start().len());
        let value = if rest.is_empty() {
            self.parse_value_block(inline_indent, rest_offset)
        } else {
            self.parse_inline_value(rest, rest_offset)
        };
        let first_span = key_span.start..value.span().end;
        let mut entries = vec![MappingEntry { key, value, span: first_span.clone() }];
        self.continue_mapping(inline_indent, &mut entries);
        let end = entries.last().map(|e| e.span.end).unwrap_or(first_span.end);
        Node::Mapping(Mapping { entries, anchor: None, span: first_span.start..end })
    }

    fn parse_inline_value(&mut self, text: &str, start: usize) -> Node {
        if let Some(name) = text.strip_prefix('*') {
            let name = name.trim().to_string();
            let span = start..(start + 1 + name.len());
            self.aliases.push(Alias { name: name.clone(), span: span.clone() });
            return Node::Alias(Alias { name, span });
        }
        if let Some(rest) = text.strip_prefix('&') {
            let name_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let name = rest[..name_len].to_string();
            let name_span = start..(start + 1 + name_len);
            let value_text = rest[name_len..].trim_start();
            let value_start = start + 1 + name_len + (rest[name_len..].len() - value_text.len());
            let mut node = if value_text.is_empty() {
                empty_scalar(value_start)
            } else {
                self.parse_scalar_or_flow(value_text, value_start)
            };
            attach_anchor(&mut node, &name);
            self.anchors.insert(name, AnchorDef { name_span, node: node.clone() });
            return node;
        }
        self.parse_scalar_or_flow(text, start)
    }

    fn parse_scalar_or_flow(&mut self, text: &str, start: usize) -> Node {
        if text.starts_with('[') {
            self.parse_flow_sequence(text, start)
        } else if text.starts_with('{') {
            self.parse_flow_mapping(text, start)
        } else {
            parse_plain_or_quoted_scalar(text, start)
        }
    }

    fn parse_flow_sequence(&mut self, text: &str, start: usize) -> Node {
        let inner = &text[1..text.len().saturating_sub(1)];
        let inner_start = start + 1;
        let mut items = Vec::new();
        for r in split_top_level(inner) {
            let piece = &inner[r.clone()];
            let piece_trimmed = piece.trim();
            if piece_trimmed.is_empty() {
                continue;
            }
            let piece_offset = inner_start + r.start + (piece.len() - piece.trim_start().len());
            items.push(self.parse_scalar_or_flow(piece_trimmed, piece_offset));
        }
        Node::Sequence(Sequence { items, anchor: None, span: start..(start + text.len()) })
    }

    fn parse_flow_mapping(&mut self, text: &str, start: usize) -> Node {
        let inner = &text[1..text.len().saturating_sub(1)];
        let inner_start = start + 1;
        let mut entries = Vec::new();
        for r in split_top_level(inner) {
            let piece = &inner[r.clone()];
            let piece_trimmed = piece.trim();
            if piece_trimmed.is_empty() {
                continue;
            }
            let piece_offset = inner_start + r.start + (piece.len() - piece.trim_start().len());
            let Some(colon) = find_key_colon(piece_trimmed) else { continue };
            let key_raw = &piece_trimmed[..colon];
            let key_span = piece_offset..(piece_offset + key_raw.trim_end().len());
            let key = self.make_key_scalar(key_raw.trim(), key_span.clone());
            let rest_raw = &piece_trimmed[colon + 1..];
            let rest = rest_raw.trim();
            let rest_offset = piece_offset + colon + 1 + (rest_raw.len() - rest_raw.trim_start().len());
            let value = if rest.is_empty() { empty_scalar(rest_offset) } else { self.parse_scalar_or_flow(rest, rest_offset) };
            let span = key_span.start..value.span().end;
            entries.push(MappingEntry { key, value, span });
        }
        Node::Mapping(Mapping { entries, anchor: None, span: start..(start + text.len()) })
    }

    fn make_key_scalar(&self, text: &str, span: Span) -> Scalar {
        match parse_plain_or_quoted_scalar(text, span.start) {
            Node::Scalar(s) => s,
            _ => Scalar { text: text.to_string(), anchor: None, quoted: false, span },
        }
    }
}

fn attach_anchor(node: &mut Node, name: &str) {
    match node {
        Node::Mapping(m) => m.anchor = Some(name.to_string()),
        Node::Sequence(s) => s.anchor = Some(name.to_string()),
        Node::Scalar(s) => s.anchor = Some(name.to_string()),
        Node::Alias(_) => {}
    }
}

fn empty_scalar(offset: usize) -> Node {
    Node::Scalar(Scalar { text: String::new(), anchor: None, quoted: false, span: offset..offset })
}

fn parse_plain_or_quoted_scalar(text: &str, start: usize) -> Node {
    let span = start..(start + text.len());
    let quoted_double = text.len() >= 2 && text.starts_with('"') && text.ends_with('"');
    let quoted_single = text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'');
    if quoted_double {
        let inner = &text[1..text.len() - 1];
        Node::Scalar(Scalar { text: unescape_double(inner), anchor: None, quoted: true, span })
    } else if quoted_single {
        let inner = &text[1..text.len() - 1];
        Node::Scalar(Scalar { text: inner.replace("''", "'"), anchor: None, quoted: true, span })
    } else {
        Node::Scalar(Scalar { text: text.to_string(), anchor: None, quoted: false, span })
    }
}

fn unescape_double(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Splits `text` on top-level commas, respecting nested `[]`/`{}` and
/// quoted strings.
fn split_top_level(text: &str) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut depth = 0i32;
    let mut in_single = false;
    let mut in_double = false;
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'[' | b'{' if !in_single && !in_double => depth += 1,
            b']' | b'}' if !in_single && !in_double => depth -= 1,
            b',' if !in_single && !in_double && depth == 0 => {
                ranges.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() || !ranges.is_empty() {
        ranges.push(start..bytes.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_mapping() {
        let (doc, errors) = parse("image: nginx\nrestart: always\n");
        assert!(errors.is_empty());
        let mapping = doc.root.unwrap();
        let mapping = mapping.as_mapping().unwrap();
        assert_eq!(mapping.entries.len(), 2);
        assert_eq!(mapping.entries[0].key.text, "image");
        assert_eq!(mapping.entries[0].value.as_scalar_text(), Some("nginx"));
    }

    #[test]
    fn parses_nested_service_block() {
        let source = "services:\n  web:\n    image: nginx\n    ports:\n      - \"80:80\"\n";
        let (doc, errors) = parse(source);
        assert!(errors.is_empty());
        let root = doc.root.unwrap();
        let services = root.as_mapping().unwrap().get("services").unwrap();
        let web = services.as_mapping().unwrap().get("web").unwrap();
        let web = web.as_mapping().unwrap();
        assert_eq!(web.get("image").unwrap().as_scalar_text(), Some("nginx"));
        let ports = web.get("ports").unwrap().as_sequence().unwrap();
        assert_eq!(ports.items[0].as_scalar_text(), Some("80:80"));
    }

    #[test]
    fn parses_dash_mapping_with_continuation() {
        let source = "networks:\n  - name: frontend\n    driver: bridge\n";
        let (doc, _) = parse(source);
        let root = doc.root.unwrap();
        let networks = root.as_mapping().unwrap().get("networks").unwrap();
        let seq = networks.as_sequence().unwrap();
        let entry = seq.items[0].as_mapping().unwrap();
        assert_eq!(entry.get("name").unwrap().as_scalar_text(), Some("frontend"));
        assert_eq!(entry.get("driver").unwrap().as_scalar_text(), Some("bridge"));
    }

    #[test]
    fn parses_flow_sequence() {
        let (doc, _) = parse("ports: [\"80:80\", \"443:443\"]\n");
        let root = doc.root.unwrap();
        let ports = root.as_mapping().unwrap().get("ports").unwrap();
        let seq = ports.as_sequence().unwrap();
        assert_eq!(seq.items.len(), 2);
        assert_eq!(seq.items[1].as_scalar_text(), Some("443:443"));
    }

    #[test]
    fn resolves_anchor_and_alias() {
        let source = "x-base: &base\n  image: nginx\nservices:\n  web:\n    <<: *base\n";
        let (doc, _) = parse(source);
        assert!(doc.anchors.contains_key("base"));
        assert_eq!(doc.aliases.len(), 1);
        let root = doc.root.unwrap();
        let web = root.as_mapping().unwrap().get("services").unwrap().as_mapping().unwrap().get("web").unwrap();
        let merge = web.as_mapping().unwrap().get("<<").unwrap();
        let resolved = doc.resolve_mapping(merge).unwrap();
        assert_eq!(resolved.get("image").unwrap().as_scalar_text(), Some("nginx"));
    }
}
