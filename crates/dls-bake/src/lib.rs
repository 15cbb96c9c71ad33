//! Bake (HCL-dialect) analyzer.
//!
//! The richest analyzer: parses `target`/`group`/`variable`/`function`
//! blocks and answers every LSP query the dispatcher can route here.
//! HCL documents are always considered "changed" on edit, since the
//! analysis is cheap enough to simply re-run, unlike the Dockerfile
//! analyzer's strict structural comparison.

pub mod inherits;
pub mod ir;
mod lexer;
mod parser;
pub mod queries;
pub mod schema;

use std::sync::Arc;

pub use lexer::CommentKind;
pub use parser::{Comment, ParseError};

#[derive(Debug, Clone)]
pub struct BakeDocument {
    pub bytes: Arc<str>,
    pub file: ir::File,
    pub comments: Vec<CommentSpan>,
    pub parse_errors: Vec<ParseErrorSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentSpan {
    pub kind: CommentKind,
    pub span: ir::Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseErrorSpan {
    pub message: String,
    pub span: ir::Span,
}

impl BakeDocument {
    pub fn parse(bytes: &str) -> Self {
        let (file, comments, errors) = parser::parse(bytes);
        Self {
            bytes: Arc::from(bytes),
            file,
            comments: comments.into_iter().map(|c| CommentSpan { kind: c.kind, span: c.span }).collect(),
            parse_errors: errors.into_iter().map(|e| ParseErrorSpan { message: e.message, span: e.span }).collect(),
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ir::Block> {
        self.file.body.iter().filter_map(|s| match s {
            ir::Structure::Block(block) => Some(block),
            _ => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &ir::Attribute> {
        self.file.body.iter().filter_map(|s| match s {
            ir::Structure::Attribute(attr) => Some(attr),
            _ => None,
        })
    }

    pub fn blocks_of_type<'a>(&'a self, ident: &'a str) -> impl Iterator<Item = &'a ir::Block> {
        self.blocks().filter(move |b| b.ident == ident)
    }

    pub fn targets(&self) -> impl Iterator<Item = &ir::Block> {
        self.blocks_of_type("target")
    }

    pub fn groups(&self) -> impl Iterator<Item = &ir::Block> {
        self.blocks_of_type("group")
    }

    pub fn variables(&self) -> impl Iterator<Item = &ir::Block> {
        self.blocks_of_type("variable")
    }

    pub fn functions(&self) -> impl Iterator<Item = &ir::Block> {
        self.blocks_of_type("function")
    }

    pub fn find_target(&self, name: &str) -> Option<&ir::Block> {
        self.targets().find(|b| b.labels.first().is_some_and(|l| l.text == name))
    }

    pub fn find_variable(&self, name: &str) -> Option<&ir::Block> {
        self.variables().find(|b| b.labels.first().is_some_and(|l| l.text == name))
    }

    pub fn find_function(&self, name: &str) -> Option<&ir::Block> {
        self.functions().find(|b| b.labels.first().is_some_and(|l| l.text == name))
    }

    /// HCL documents are always considered changed on edit.
    pub fn changed_from(&self, _previous: &BakeDocument) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_target_and_variable_by_label() {
        let doc = BakeDocument::parse("variable \"TAG\" {\n  default = \"latest\"\n}\ntarget \"app\" {\n  args = { TAG = \"${TAG}\" }\n}\n");
        assert!(doc.find_target("app").is_some());
        assert!(doc.find_variable("TAG").is_some());
        assert!(doc.find_target("missing").is_none());
    }

    #[test]
    fn is_always_considered_changed() {
        let a = BakeDocument::parse("target \"a\" {}\n");
        let b = BakeDocument::parse("target \"a\" {}\n");
        assert!(b.changed_from(&a));
    }
}
