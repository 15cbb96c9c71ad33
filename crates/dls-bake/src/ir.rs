//! The parsed shape of a Bake document: blocks, attributes, and
//! expressions, each carrying its own byte span.
//!
//! Built by [`crate::parser`] instead of leaning on a third-party HCL
//! crate: the query layer below only ever touches this IR, so the one
//! place that has to get HCL's grammar right is contained to a single
//! module.

use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub body: Vec<Structure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    Attribute(Attribute),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub name_span: Span,
    pub value: Expr,
    /// Span of the whole `name = value` line, used for quick-fix edits
    /// that delete an entire attribute.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Span of the label including surrounding quotes, if quoted.
    pub span: Span,
    pub quoted: bool,
}

impl Label {
    /// The span with quotes trimmed off.
    pub fn unquoted_span(&self) -> Span {
        if self.quoted {
            (self.span.start + 1)..(self.span.end - 1)
        } else {
            self.span.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub ident: String,
    pub ident_span: Span,
    pub labels: Vec<Label>,
    pub body: Vec<Structure>,
    /// Span of the block's opening line (`ident label... {`), used for
    /// code lens placement.
    pub header_span: Span,
    pub span: Span,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.body.iter().find_map(|s| match s {
            Structure::Attribute(attr) if attr.name == name => Some(attr),
            _ => None,
        })
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.body.iter().filter_map(|s| match s {
            Structure::Block(block) => Some(block),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null(Span),
    Bool(bool, Span),
    Number(f64, Span),
    /// A plain (non-templated) string literal; `text` excludes quotes.
    String { text: String, span: Span },
    /// A `"${...}"`-templated string; `parts` alternate between literal
    /// text and interpolated sub-expressions in source order.
    Template { parts: Vec<TemplatePart>, span: Span },
    /// A bare identifier or dotted traversal (`target.base.context`).
    Traversal { segments: Vec<(String, Span)>, span: Span },
    Array { items: Vec<Expr>, span: Span },
    Object { items: Vec<ObjectItem>, span: Span },
    Conditional { cond: Box<Expr>, if_true: Box<Expr>, if_false: Box<Expr>, span: Span },
    BinaryOp { lhs: Box<Expr>, op: String, rhs: Box<Expr>, span: Span },
    UnaryOp { op: String, operand: Box<Expr>, span: Span },
    FuncCall { name: String, name_span: Span, args: Vec<Expr>, span: Span },
    ForExpr { collection: Box<Expr>, condition: Option<Box<Expr>>, span: Span },
    Parenthesis { inner: Box<Expr>, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String, Span),
    Interpolation(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Null(s)
            | Expr::Bool(_, s)
            | Expr::Number(_, s)
            | Expr::String { span: s, .. }
            | Expr::Template { span: s, .. }
            | Expr::Traversal { span: s, .. }
            | Expr::Array { span: s, .. }
            | Expr::Object { span: s, .. }
            | Expr::Conditional { span: s, .. }
            | Expr::BinaryOp { span: s, .. }
            | Expr::UnaryOp { span: s, .. }
            | Expr::FuncCall { span: s, .. }
            | Expr::ForExpr { span: s, .. }
            | Expr::Parenthesis { span: s, .. } => s.clone(),
        }
    }

    /// The literal string value if this expression is (or simplifies to)
    /// a plain string, used wherever a query only cares about a simple
    /// literal attribute value.
    pub fn as_literal_str(&self) -> Option<&str> {
        match self {
            Expr::String { text, .. } => Some(text.as_str()),
            Expr::Parenthesis { inner, .. } => inner.as_literal_str(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Expr::Bool(value, _) => Some(*value),
            _ => None,
        }
    }

    /// All literal string elements of an array expression (`tags`,
    /// `entitlements`, group `targets`, ...).
    pub fn array_literals(&self) -> Vec<(&str, Span)> {
        match self {
            Expr::Array { items, .. } => items
                .iter()
                .filter_map(|item| item.as_literal_str().map(|text| (text, item.span())))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Children in source order, for recursive position resolution.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Array { items, .. } => items.iter().collect(),
            Expr::Object { items, .. } => items.iter().flat_map(|item| [&item.key, &item.value]).collect(),
            Expr::Conditional { cond, if_true, if_false, .. } => vec![cond, if_true, if_false],
            Expr::BinaryOp { lhs, rhs, .. } => vec![lhs, rhs],
            Expr::UnaryOp { operand, .. } => vec![operand],
            Expr::FuncCall { args, .. } => args.iter().collect(),
            Expr::ForExpr { collection, condition, .. } => {
                let mut out = vec![collection.as_ref()];
                if let Some(cond) = condition {
                    out.push(cond);
                }
                out
            }
            Expr::Parenthesis { inner, .. } => vec![inner],
            Expr::Template { parts, .. } => parts
                .iter()
                .filter_map(|part| match part {
                    TemplatePart::Interpolation(expr) => Some(expr),
                    TemplatePart::Literal(..) => None,
                })
                .collect(),
            Expr::Null(_) | Expr::Bool(..) | Expr::Number(..) | Expr::String { .. } | Expr::Traversal { .. } => Vec::new(),
        }
    }
}
