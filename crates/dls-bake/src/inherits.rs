//! `inherits` chain flattening and the Dockerfile reference derived
//! from it.

use dls_xref::{BaseFolder, BuildRef, DockerfileRef, RefValue};
use rustc_hash::FxHashSet;

use crate::ir::{Block, Expr};
use crate::BakeDocument;

/// The outcome of walking a target's `inherits` chain.
#[derive(Debug, Clone, PartialEq)]
pub enum InheritsChain {
    /// Every visited target resolved to a literal; `order` lists target
    /// labels from the requested target outward to its most distant
    /// ancestor, each appearing once.
    Resolved { order: Vec<String> },
    /// A cycle was detected through the visited set.
    Cycle,
    /// Some ancestor references `inherits` with a non-literal element,
    /// tainting the whole chain per §4.7 rule 7.
    Unresolved,
}

pub fn flatten_inherits(doc: &BakeDocument, target_label: &str) -> InheritsChain {
    let mut order = Vec::new();
    let mut visited = FxHashSet::default();
    let mut stack = vec![target_label.to_string()];

    while let Some(label) = stack.pop() {
        if !visited.insert(label.clone()) {
            if order.contains(&label) {
                return InheritsChain::Cycle;
            }
            continue;
        }
        order.push(label.clone());
        let Some(block) = doc.find_target(&label) else { continue };
        let Some(inherits) = block.attribute("inherits") else { continue };
        match &inherits.value {
            Expr::Array { items, .. } => {
                for item in items {
                    match item.as_literal_str() {
                        Some(parent) => stack.push(parent.to_string()),
                        None => return InheritsChain::Unresolved,
                    }
                }
            }
            _ => return InheritsChain::Unresolved,
        }
    }

    InheritsChain::Resolved { order }
}

/// Resolves `target`'s effective `context`/`dockerfile`/`dockerfile-inline`
/// by walking `inherits` ancestors depth-first until one sets them.
pub fn effective_build_ref(doc: &BakeDocument, target_label: &str) -> Option<BuildRef> {
    match flatten_inherits(doc, target_label) {
        InheritsChain::Resolved { order } => {
            let mut build = BuildRef::default();
            for label in order {
                let Some(block) = doc.find_target(&label) else { continue };
                if build.dockerfile_inline || block.attribute("dockerfile-inline").is_some() {
                    build.dockerfile_inline = true;
                    return Some(build);
                }
                if build.context.is_none() {
                    build.context = block.attribute("context").map(to_ref_value);
                }
                if build.dockerfile.is_none() {
                    build.dockerfile = block.attribute("dockerfile").map(to_ref_value);
                }
                if build.context.is_some() && build.dockerfile.is_some() {
                    break;
                }
            }
            Some(build)
        }
        InheritsChain::Cycle | InheritsChain::Unresolved => None,
    }
}

fn to_ref_value(attr: &crate::ir::Attribute) -> RefValue {
    match attr.value.as_literal_str() {
        Some(text) => RefValue::Literal(text.to_string()),
        None => RefValue::NonLiteral,
    }
}

/// Resolves the Dockerfile `target_label` builds against, given the
/// Bake document's own folder.
pub fn resolve_target_dockerfile(doc: &BakeDocument, target_label: &str, base: &BaseFolder) -> DockerfileRef {
    match effective_build_ref(doc, target_label) {
        Some(build) => dls_xref::resolve_dockerfile_ref(base, &build),
        None => DockerfileRef::Unresolvable,
    }
}

pub fn inherits_targets(block: &Block) -> Vec<(String, crate::ir::Span)> {
    let Some(attr) = block.attribute("inherits") else { return Vec::new() };
    attr.value.array_literals().into_iter().map(|(text, span)| (text.to_string(), span)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_a_linear_chain() {
        let doc = BakeDocument::parse(
            "target \"base\" {\n  context = \".\"\n}\ntarget \"mid\" {\n  inherits = [\"base\"]\n}\ntarget \"leaf\" {\n  inherits = [\"mid\"]\n}\n",
        );
        let InheritsChain::Resolved { order } = flatten_inherits(&doc, "leaf") else {
            panic!("expected resolved chain")
        };
        assert_eq!(order, vec!["leaf", "mid", "base"]);
    }

    #[test]
    fn detects_cycles() {
        let doc = BakeDocument::parse(
            "target \"a\" {\n  inherits = [\"b\"]\n}\ntarget \"b\" {\n  inherits = [\"a\"]\n}\n",
        );
        assert_eq!(flatten_inherits(&doc, "a"), InheritsChain::Cycle);
    }

    #[test]
    fn non_literal_inherits_element_taints_the_chain() {
        let doc = BakeDocument::parse("target \"a\" {\n  inherits = [foo]\n}\n");
        assert_eq!(flatten_inherits(&doc, "a"), InheritsChain::Unresolved);
    }

    #[test]
    fn effective_build_ref_walks_to_the_ancestor_that_sets_context() {
        let doc = BakeDocument::parse(
            "target \"base\" {\n  context = \"services/api\"\n}\ntarget \"leaf\" {\n  inherits = [\"base\"]\n}\n",
        );
        let build = effective_build_ref(&doc, "leaf").unwrap();
        assert_eq!(build.context, Some(RefValue::Literal("services/api".to_string())));
    }
}
