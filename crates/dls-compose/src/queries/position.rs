//! Position to AST-node resolution over the Compose YAML tree.

use dls_core::LineIndex;
use lsp_types::Position;

use crate::ir::{MappingEntry, Node};
use crate::ComposeDocument;

pub struct Focus<'a> {
    /// The chain of mapping entries from the document root down to (and
    /// including) the innermost entry whose span contains the offset.
    pub path: Vec<&'a MappingEntry>,
    pub node: &'a Node,
    pub offset: usize,
}

impl<'a> Focus<'a> {
    /// The dotted key path leading to the focused node, e.g.
    /// `["services", "web", "depends_on"]`.
    pub fn key_path(&self) -> Vec<&str> {
        self.path.iter().map(|e| e.key.text.as_str()).collect()
    }
}

pub fn offset_at(doc: &ComposeDocument, position: Position) -> usize {
    let index = LineIndex::new(&doc.bytes);
    index.position_to_offset(&doc.bytes, position)
}

pub fn focus_at(doc: &ComposeDocument, position: Position) -> Option<Focus<'_>> {
    let offset = offset_at(doc, position);
    let root = doc.yaml.root.as_ref()?;
    if !span_covers(&root.span(), offset) {
        return None;
    }
    let mut path = Vec::new();
    let node = find_in_node(root, offset, &mut path);
    Some(Focus { path, node, offset })
}

fn find_in_node<'a>(node: &'a Node, offset: usize, path: &mut Vec<&'a MappingEntry>) -> &'a Node {
    match node {
        Node::Mapping(mapping) => {
            for entry in &mapping.entries {
                if span_covers(&entry.span, offset) {
                    path.push(entry);
                    return find_in_node(&entry.value, offset, path);
                }
            }
            node
        }
        Node::Sequence(sequence) => {
            for item in &sequence.items {
                if span_covers(&item.span(), offset) {
                    return find_in_node(item, offset, path);
                }
            }
            node
        }
        Node::Scalar(_) | Node::Alias(_) => node,
    }
}

pub fn span_covers(span: &std::ops::Range<usize>, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focuses_nested_scalar_under_a_service() {
        let doc = ComposeDocument::parse("services:\n  web:\n    image: nginx\n");
        let offset = doc.bytes.rfind("nginx").unwrap();
        let index = LineIndex::new(&doc.bytes);
        let position = index.offset_to_position(&doc.bytes, offset + 1);
        let focus = focus_at(&doc, position).unwrap();
        assert_eq!(focus.key_path(), vec!["services", "web", "image"]);
        assert_eq!(focus.node.as_scalar_text(), Some("nginx"));
    }
}
