//! Document symbol, semantic tokens, document link, and code lens.

use dls_core::LineIndex;
use dls_xref::BaseFolder;
use lsp_types::{
    DocumentLink, DocumentSymbol, Position, Range, SemanticToken, SymbolKind,
};
use serde_json::json;

use crate::ir::{Block, Expr, Span, Structure, TemplatePart};
use crate::lexer::CommentKind;
use crate::BakeDocument;

pub fn document_symbols(doc: &BakeDocument) -> Vec<DocumentSymbol> {
    let index = LineIndex::new(&doc.bytes);
    doc.file.body.iter().filter_map(|s| structure_symbol(doc, &index, s)).collect()
}

#[allow(deprecated)]
fn structure_symbol(doc: &BakeDocument, index: &LineIndex, structure: &Structure) -> Option<DocumentSymbol> {
    match structure {
        Structure::Attribute(attr) => Some(DocumentSymbol {
            name: attr.name.clone(),
            detail: None,
            kind: SymbolKind::PROPERTY,
            tags: None,
            deprecated: None,
            range: index.range(&doc.bytes, attr.span.clone()),
            selection_range: index.range(&doc.bytes, attr.name_span.clone()),
            children: None,
        }),
        Structure::Block(block) => {
            let kind = match block.ident.as_str() {
                "variable" => SymbolKind::VARIABLE,
                _ => SymbolKind::FUNCTION,
            };
            let name = block
                .labels
                .first()
                .map(|l| format!("{} {}", block.ident, l.text))
                .unwrap_or_else(|| block.ident.clone());
            let selection_range = block
                .labels
                .first()
                .map(|l| index.range(&doc.bytes, l.unquoted_span()))
                .unwrap_or_else(|| index.range(&doc.bytes, block.ident_span.clone()));
            let children: Vec<DocumentSymbol> = block
                .body
                .iter()
                .filter_map(|s| structure_symbol(doc, index, s))
                .collect();
            Some(DocumentSymbol {
                name,
                detail: None,
                kind,
                tags: None,
                deprecated: None,
                range: index.range(&doc.bytes, block.span.clone()),
                selection_range,
                children: Some(children),
            })
        }
    }
}

pub struct CodeLensEntry {
    pub range: Range,
    pub call: &'static str,
    pub target: String,
}

/// `group`/`target` blocks with at least one label get three lenses
/// (`build`/`check`/`print`) on their opening line.
pub fn code_lenses(doc: &BakeDocument) -> Vec<CodeLensEntry> {
    let index = LineIndex::new(&doc.bytes);
    doc.blocks()
        .filter(|b| b.ident == "target" || b.ident == "group")
        .filter_map(|b| b.labels.first().map(|l| (b, l)))
        .flat_map(|(block, label)| {
            let range = index.range(&doc.bytes, block.header_span.start..block.header_span.start);
            ["build", "check", "print"].into_iter().map(move |call| CodeLensEntry {
                range,
                call,
                target: label.text.clone(),
            })
        })
        .collect()
}

impl CodeLensEntry {
    pub fn command_arguments(&self, cwd: &str) -> serde_json::Value {
        json!({ "call": self.call, "target": self.target, "cwd": cwd })
    }
}

/// `dockerfile` attribute whose value is a quoted string literal: a link
/// to the resolved native path.
pub fn document_links(doc: &BakeDocument, base: &BaseFolder) -> Vec<DocumentLink> {
    let index = LineIndex::new(&doc.bytes);
    doc.targets()
        .filter_map(|target| target.attribute("dockerfile"))
        .filter_map(|attr| {
            let literal = attr.value.as_literal_str()?;
            let (uri, native_path) = dls_core::uri::concatenate(&base.native, literal, base.wsl_distro.as_deref());
            Some(DocumentLink {
                range: index.range(&doc.bytes, attr.value.span()),
                target: Some(uri),
                tooltip: Some(native_path),
                data: None,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Type,
    Class,
    Property,
    String,
    Variable,
    Operator,
    Keyword,
    Number,
    Comment,
}

pub const TOKEN_TYPES: &[TokenType] = &[
    TokenType::Type,
    TokenType::Class,
    TokenType::Property,
    TokenType::String,
    TokenType::Variable,
    TokenType::Operator,
    TokenType::Keyword,
    TokenType::Number,
    TokenType::Comment,
];

fn token_index(kind: TokenType) -> u32 {
    TOKEN_TYPES.iter().position(|t| *t == kind).unwrap_or(0) as u32
}

struct RawToken {
    range: Range,
    kind: TokenType,
}

/// Builds the full semantic token stream for a Bake document.
pub fn semantic_tokens(doc: &BakeDocument) -> Vec<SemanticToken> {
    let index = LineIndex::new(&doc.bytes);
    let mut raw = Vec::new();

    for structure in &doc.file.body {
        collect_structure(&doc.bytes, &index, structure, &mut raw);
    }
    for comment in &doc.comments {
        collect_comment(&doc.bytes, &index, comment, &mut raw);
    }

    raw.sort_by_key(|t| (t.range.start.line, t.range.start.character));
    encode(&raw)
}

fn collect_structure(bytes: &str, index: &LineIndex, structure: &Structure, out: &mut Vec<RawToken>) {
    match structure {
        Structure::Attribute(attr) => {
            out.push(RawToken { range: index.range(bytes, attr.name_span.clone()), kind: TokenType::Property });
            collect_expr(bytes, index, &attr.value, out);
        }
        Structure::Block(block) => {
            out.push(RawToken { range: index.range(bytes, block.ident_span.clone()), kind: TokenType::Type });
            for label in &block.labels {
                out.push(RawToken { range: index.range(bytes, label.span.clone()), kind: TokenType::Class });
            }
            for child in &block.body {
                collect_structure(bytes, index, child, out);
            }
        }
    }
}

fn collect_expr(bytes: &str, index: &LineIndex, expr: &Expr, out: &mut Vec<RawToken>) {
    match expr {
        Expr::String { span, .. } => out.push(RawToken { range: index.range(bytes, span.clone()), kind: TokenType::String }),
        Expr::Number(_, span) => out.push(RawToken { range: index.range(bytes, span.clone()), kind: TokenType::Number }),
        Expr::Bool(..) | Expr::Null(_) => out.push(RawToken { range: index.range(bytes, expr.span()), kind: TokenType::Keyword }),
        Expr::Traversal { segments, .. } => {
            for (_, span) in segments {
                out.push(RawToken { range: index.range(bytes, span.clone()), kind: TokenType::Variable });
            }
        }
        Expr::Template { parts, .. } => {
            for part in parts {
                match part {
                    TemplatePart::Literal(_, span) => {
                        out.push(RawToken { range: index.range(bytes, span.clone()), kind: TokenType::String });
                    }
                    TemplatePart::Interpolation(inner) => {
                        mark_template_operators(bytes, index, inner.span(), out);
                        collect_expr(bytes, index, inner, out);
                    }
                }
            }
        }
        Expr::Object { items, .. } => {
            for item in items {
                collect_expr(bytes, index, &item.key, out);
                collect_expr(bytes, index, &item.value, out);
            }
        }
        Expr::Array { items, .. } => {
            for item in items {
                collect_expr(bytes, index, item, out);
            }
        }
        Expr::FuncCall { args, .. } => {
            for arg in args {
                collect_expr(bytes, index, arg, out);
            }
        }
        _ => {
            for child in expr.children() {
                collect_expr(bytes, index, child, out);
            }
        }
    }
}

/// Marks the `${`/`}` delimiters around a template interpolation as
/// `operator` tokens.
fn mark_template_operators(bytes: &str, index: &LineIndex, inner_span: Span, out: &mut Vec<RawToken>) {
    let open_start = inner_span.start.saturating_sub(2);
    out.push(RawToken { range: index.range(bytes, open_start..inner_span.start), kind: TokenType::Operator });
    out.push(RawToken { range: index.range(bytes, inner_span.end..(inner_span.end + 1)), kind: TokenType::Operator });
}

/// Emits one token per source line for a multi-line `/* ... */` comment.
fn collect_comment(bytes: &str, index: &LineIndex, comment: &crate::CommentSpan, out: &mut Vec<RawToken>) {
    if comment.kind == CommentKind::Line {
        out.push(RawToken { range: index.range(bytes, comment.span.clone()), kind: TokenType::Comment });
        return;
    }
    let start = index.offset_to_position(bytes, comment.span.start);
    let end = index.offset_to_position(bytes, comment.span.end);
    if start.line == end.line {
        out.push(RawToken { range: Range::new(start, end), kind: TokenType::Comment });
        return;
    }
    for line in start.line..=end.line {
        let line_start = if line == start.line { start.character } else { 0 };
        let line_end = if line == end.line {
            end.character
        } else {
            line_end_character(bytes, line)
        };
        out.push(RawToken {
            range: Range::new(Position::new(line, line_start), Position::new(line, line_end)),
            kind: TokenType::Comment,
        });
    }
}

fn line_end_character(bytes: &str, line: u32) -> u32 {
    bytes
        .split('\n')
        .nth(line as usize)
        .map(|text| text.trim_end_matches('\r').chars().map(char::len_utf16).sum::<usize>() as u32)
        .unwrap_or(0)
}

fn encode(tokens: &[RawToken]) -> Vec<SemanticToken> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut prev_line = 0u32;
    let mut prev_start = 0u32;
    for token in tokens {
        let line = token.range.start.line;
        let start = token.range.start.character;
        let length = token.range.end.character.saturating_sub(start).max(1);
        let delta_line = line - prev_line;
        let delta_start = if delta_line == 0 { start - prev_start } else { start };
        out.push(SemanticToken {
            delta_line,
            delta_start,
            length,
            token_type: token_index(token.kind),
            token_modifiers_bitset: 0,
        });
        prev_line = line;
        prev_start = start;
    }
    out
}

/// Every block whose label range, attribute-name range, or `target`
/// keyword this document's definitions should be reachable from.
pub fn all_block_labels(doc: &BakeDocument) -> Vec<&Block> {
    doc.blocks().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_symbols_classify_blocks_and_attributes() {
        let doc = BakeDocument::parse("variable \"TAG\" {\n  default = \"x\"\n}\ntarget \"app\" {\n  context = \".\"\n}\n");
        let symbols = document_symbols(&doc);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].kind, SymbolKind::VARIABLE);
        assert_eq!(symbols[1].kind, SymbolKind::FUNCTION);
        assert_eq!(symbols[1].children.as_ref().unwrap()[0].kind, SymbolKind::PROPERTY);
    }

    #[test]
    fn code_lenses_emit_three_commands_per_labeled_block() {
        let doc = BakeDocument::parse("target \"first\" {\n  target = \"abc\"\n}\n");
        let lenses = code_lenses(&doc);
        assert_eq!(lenses.len(), 3);
        assert!(lenses.iter().all(|l| l.range.start.line == 0));
        assert_eq!(lenses[0].target, "first");
    }

    #[test]
    fn semantic_tokens_cover_each_character_at_most_once() {
        let doc = BakeDocument::parse("target \"app\" {\n  context = \".\"\n  tags = [\"a:${TAG}\"]\n}\n");
        let tokens = semantic_tokens(&doc);
        assert!(!tokens.is_empty());
        let mut line = 0i64;
        let mut col = 0i64;
        for token in &tokens {
            line += token.delta_line as i64;
            if token.delta_line != 0 {
                col = token.delta_start as i64;
            } else {
                col += token.delta_start as i64;
            }
            assert!(line >= 0 && col >= 0);
        }
    }
}
