//! Dockerfile analyzer.
//!
//! Parses a Dockerfile into its linear instruction chain and answers the
//! handful of structural queries the Bake and Compose cross-reference
//! resolvers need, plus the analyzer's own
//! standalone diagnostics.

pub mod diagnostics;
mod parser;
pub mod queries;

use std::sync::Arc;

pub use parser::{Flag, Instruction, ParserDirectives};

/// A parsed Dockerfile: bytes plus the instruction chain.
#[derive(Debug, Clone)]
pub struct DockerfileDocument {
    pub bytes: Arc<str>,
    pub instructions: Vec<Instruction>,
    pub directives: ParserDirectives,
}

impl DockerfileDocument {
    pub fn parse(bytes: &str) -> Self {
        let (instructions, directives) = parser::parse(bytes);
        Self {
            bytes: Arc::from(bytes),
            instructions,
            directives,
        }
    }

    /// Strict change detection for Dockerfiles: whitespace or
    /// trailing-comment-only edits must not count as "changed".
    pub fn changed_from(&self, previous: &DockerfileDocument) -> bool {
        if self.directives != previous.directives {
            return true;
        }
        if self.instructions.len() != previous.instructions.len() {
            return true;
        }
        self.instructions
            .iter()
            .zip(previous.instructions.iter())
            .any(|(new, old)| {
                new.value != old.value
                    || new.args != old.args
                    || new.flags != old.flags
                    || new.start_line != old.start_line
                    || new.end_line != old.end_line
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_edit_is_not_a_change() {
        let a = DockerfileDocument::parse("FROM scratch\nRUN echo hi\n");
        let b = DockerfileDocument::parse("FROM scratch\nRUN echo hi   \n");
        assert!(!b.changed_from(&a));
    }

    #[test]
    fn instruction_value_edit_is_a_change() {
        let a = DockerfileDocument::parse("FROM scratch\n");
        let b = DockerfileDocument::parse("FROM alpine\n");
        assert!(b.changed_from(&a));
    }
}
