//! Structural queries over a parsed [`crate::DockerfileDocument`],
//! reused by the Bake/Compose cross-reference resolver.

use dls_core::LineIndex;
use lsp_types::{Position, Range};

use crate::{DockerfileDocument, Instruction};

/// A `FROM ... AS <name>` stage, or an unnamed stage addressed by its
/// zero-based index among all `FROM` instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    pub name: Option<String>,
    pub base: String,
    pub range: Range,
}

/// A declared build argument, with its default value if any and whether a
/// later instruction in the same stage interpolates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDeclaration {
    pub name: String,
    pub default: Option<String>,
    pub range: Range,
}

impl DockerfileDocument {
    fn line_index(&self) -> LineIndex {
        LineIndex::new(&self.bytes)
    }

    pub fn instruction_at(&self, position: Position) -> Option<&Instruction> {
        let index = self.line_index();
        let offset = index.position_to_offset(&self.bytes, position);
        self.instructions
            .iter()
            .find(|instruction| instruction.span.contains(&offset) || instruction.span.end == offset)
    }

    /// All `FROM` instructions as [`Stage`]s, in source order.
    pub fn stages(&self) -> Vec<Stage> {
        let index = self.line_index();
        self.instructions
            .iter()
            .filter(|instruction| instruction.value == "FROM")
            .enumerate()
            .map(|(position, instruction)| {
                let (base, name) = split_from_args(&instruction.args);
                Stage {
                    index: position,
                    name,
                    base,
                    range: index.range(&self.bytes, instruction.span.clone()),
                }
            })
            .collect()
    }

    /// Looks up a stage by name, falling back to treating `name` as a
    /// numeric index (`FROM 0` is legal Dockerfile syntax).
    pub fn stage_by_reference(&self, reference: &str) -> Option<Stage> {
        let stages = self.stages();
        if let Some(stage) = stages
            .iter()
            .find(|stage| stage.name.as_deref() == Some(reference))
        {
            return Some(stage.clone());
        }
        let as_index: usize = reference.parse().ok()?;
        stages.into_iter().find(|stage| stage.index == as_index)
    }

    /// All `ARG` declarations in source order. `stage_start` restricts the
    /// scan to instructions at or after that instruction index, matching
    /// Dockerfile's per-stage ARG scoping.
    pub fn args(&self) -> Vec<ArgDeclaration> {
        let index = self.line_index();
        self.instructions
            .iter()
            .filter(|instruction| instruction.value == "ARG")
            .flat_map(|instruction| {
                let range = index.range(&self.bytes, instruction.span.clone());
                split_arg_declarations(&instruction.args, range)
            })
            .collect()
    }

    pub fn range_of(&self, instruction: &Instruction) -> Range {
        self.line_index().range(&self.bytes, instruction.span.clone())
    }
}

fn split_from_args(args: &str) -> (String, Option<String>) {
    let mut tokens = args.split_whitespace();
    let base = tokens.next().unwrap_or_default().to_string();
    let mut name = None;
    while let Some(token) = tokens.next() {
        if token.eq_ignore_ascii_case("as") {
            name = tokens.next().map(str::to_string);
            break;
        }
    }
    (base, name)
}

fn split_arg_declarations(args: &str, range: Range) -> Vec<ArgDeclaration> {
    args.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once('=') {
            Some((name, default)) => ArgDeclaration {
                name: name.trim().to_string(),
                default: Some(default.trim().trim_matches('"').to_string()),
                range,
            },
            None => ArgDeclaration {
                name: token.to_string(),
                default: None,
                range,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_capture_name_and_base_image() {
        let doc = DockerfileDocument::parse("FROM golang:1.22 AS build\nFROM scratch\n");
        let stages = doc.stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].name.as_deref(), Some("build"));
        assert_eq!(stages[0].base, "golang:1.22");
        assert_eq!(stages[1].name, None);
    }

    #[test]
    fn stage_by_reference_resolves_name_or_index() {
        let doc = DockerfileDocument::parse("FROM golang:1.22 AS build\nFROM scratch\n");
        assert_eq!(doc.stage_by_reference("build").unwrap().index, 0);
        assert_eq!(doc.stage_by_reference("0").unwrap().name.as_deref(), Some("build"));
        assert!(doc.stage_by_reference("missing").is_none());
    }

    #[test]
    fn args_parse_defaults() {
        let doc = DockerfileDocument::parse("FROM scratch\nARG VERSION=1.0\nARG DEBUG\n");
        let args = doc.args();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].name, "VERSION");
        assert_eq!(args[0].default.as_deref(), Some("1.0"));
        assert_eq!(args[1].default, None);
    }

    #[test]
    fn instruction_at_finds_the_enclosing_instruction() {
        let doc = DockerfileDocument::parse("FROM scratch\nRUN echo hi\n");
        let position = Position::new(1, 2);
        let found = doc.instruction_at(position).unwrap();
        assert_eq!(found.value, "RUN");
    }
}
