//! Formatting: re-serialize the parsed IR with normalized spacing and
//! indentation, then emit a single edit replacing the whole document
//! when the result differs.

use dls_core::LineIndex;
use lsp_types::{FormattingOptions, Position, Range, TextEdit};

use crate::ir::{Block, Expr, Label, ObjectItem, Structure, TemplatePart};
use crate::BakeDocument;

struct FormatConfig {
    indent_unit: String,
}

impl From<&FormattingOptions> for FormatConfig {
    fn from(options: &FormattingOptions) -> Self {
        let width = (options.tab_size.max(1)) as usize;
        let indent_unit = if options.insert_spaces { " ".repeat(width) } else { "\t".to_string() };
        FormatConfig { indent_unit }
    }
}

pub fn formatting(doc: &BakeDocument, options: &FormattingOptions) -> Option<Vec<TextEdit>> {
    if !doc.parse_errors.is_empty() {
        return None;
    }
    let config = FormatConfig::from(options);
    let formatted = format_document(doc, &config);
    if formatted == doc.bytes {
        return Some(Vec::new());
    }
    let index = LineIndex::new(&doc.bytes);
    let end = index.offset_to_position(&doc.bytes, doc.bytes.len());
    Some(vec![TextEdit {
        range: Range::new(Position::new(0, 0), end),
        new_text: formatted,
    }])
}

fn format_document(doc: &BakeDocument, config: &FormatConfig) -> String {
    let mut out = String::new();
    for (i, structure) in doc.file.body.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_structure(&mut out, structure, 0, config);
    }
    out
}

fn write_indent(out: &mut String, depth: usize, config: &FormatConfig) {
    for _ in 0..depth {
        out.push_str(&config.indent_unit);
    }
}

fn write_structure(out: &mut String, structure: &Structure, depth: usize, config: &FormatConfig) {
    match structure {
        Structure::Attribute(attr) => {
            write_indent(out, depth, config);
            out.push_str(&attr.name);
            out.push_str(" = ");
            write_expr(out, &attr.value);
            out.push('\n');
        }
        Structure::Block(block) => write_block(out, block, depth, config),
    }
}

fn write_block(out: &mut String, block: &Block, depth: usize, config: &FormatConfig) {
    write_indent(out, depth, config);
    out.push_str(&block.ident);
    for label in &block.labels {
        out.push(' ');
        write_label(out, label);
    }
    out.push(' ');

    if let [single] = block.body.as_slice() {
        if let Structure::Attribute(attr) = single {
            out.push_str("{ ");
            out.push_str(&attr.name);
            out.push_str(" = ");
            write_expr(out, &attr.value);
            out.push_str(" }\n");
            return;
        }
    }

    out.push_str("{\n");
    for child in &block.body {
        write_structure(out, child, depth + 1, config);
    }
    write_indent(out, depth, config);
    out.push_str("}\n");
}

fn write_label(out: &mut String, label: &Label) {
    if label.quoted {
        out.push('"');
        out.push_str(&label.text);
        out.push('"');
    } else {
        out.push_str(&label.text);
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Null(_) => out.push_str("null"),
        Expr::Bool(value, _) => out.push_str(if *value { "true" } else { "false" }),
        Expr::Number(value, _) => out.push_str(&format_number(*value)),
        Expr::String { text, .. } => {
            out.push('"');
            out.push_str(&escape(text));
            out.push('"');
        }
        Expr::Template { parts, .. } => {
            out.push('"');
            for part in parts {
                match part {
                    TemplatePart::Literal(text, _) => out.push_str(&escape(text)),
                    TemplatePart::Interpolation(inner) => {
                        out.push_str("${");
                        write_expr(out, inner);
                        out.push('}');
                    }
                }
            }
            out.push('"');
        }
        Expr::Traversal { segments, .. } => {
            for (i, (name, _)) in segments.iter().enumerate() {
                if i > 0 {
                    out.push('.');
                }
                out.push_str(name);
            }
        }
        Expr::Array { items, .. } => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item);
            }
            out.push(']');
        }
        Expr::Object { items, .. } => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_object_item(out, item);
            }
            out.push('}');
        }
        Expr::Conditional { cond, if_true, if_false, .. } => {
            write_expr(out, cond);
            out.push_str(" ? ");
            write_expr(out, if_true);
            out.push_str(" : ");
            write_expr(out, if_false);
        }
        Expr::BinaryOp { lhs, op, rhs, .. } => {
            write_expr(out, lhs);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            write_expr(out, rhs);
        }
        Expr::UnaryOp { op, operand, .. } => {
            out.push_str(op);
            write_expr(out, operand);
        }
        Expr::FuncCall { name, args, .. } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg);
            }
            out.push(')');
        }
        Expr::ForExpr { collection, condition, .. } => {
            out.push_str("[for v in ");
            write_expr(out, collection);
            out.push_str(" : v");
            if let Some(cond) = condition {
                out.push_str(" if ");
                write_expr(out, cond);
            }
            out.push(']');
        }
        Expr::Parenthesis { inner, .. } => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
    }
}

fn write_object_item(out: &mut String, item: &ObjectItem) {
    write_expr(out, &item.key);
    out.push_str(" = ");
    write_expr(out, &item.value);
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> FormattingOptions {
        FormattingOptions { tab_size: 2, insert_spaces: true, ..Default::default() }
    }

    #[test]
    fn normalizes_spacing_around_equals_and_braces() {
        let doc = BakeDocument::parse("target \"app\"   {\ncontext=\".\"\n}\n");
        let edits = formatting(&doc, &options()).unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "target \"app\" {\n  context = \".\"\n}\n");
    }

    #[test]
    fn collapses_single_attribute_blocks_onto_one_line() {
        let doc = BakeDocument::parse("group \"default\" {\ntargets = [\"app\"]\n}\n");
        let edits = formatting(&doc, &options()).unwrap();
        assert_eq!(edits[0].new_text, "group \"default\" { targets = [\"app\"] }\n");
    }

    #[test]
    fn returns_no_edits_when_already_formatted() {
        let doc = BakeDocument::parse("target \"app\" {\n  context = \".\"\n}\n");
        let edits = formatting(&doc, &options()).unwrap();
        assert!(edits.is_empty());
    }

    #[test]
    fn bails_out_on_syntax_errors() {
        let doc = BakeDocument::parse("target \"app\" {\n  context = \n}\n");
        if !doc.parse_errors.is_empty() {
            assert!(formatting(&doc, &options()).is_none());
        }
    }
}
