//! Cross-reference resolver.
//!
//! Single responsibility: given a Bake target block's or a Compose
//! service's `build` attributes, determine the Dockerfile it targets.
//!
//! This crate never depends on `hcl-edit` or `saphyr` types: `dls-bake`
//! and `dls-compose` flatten their own attribute expressions down to a
//! [`RefValue`] first (a literal string, or "not a literal" if the
//! expression contains interpolation, a conditional, or anything else
//! that would need full HCL/YAML evaluation to resolve) and hand those
//! primitives in here. Keeping the boundary primitive-typed means both
//! analyzer crates can depend on this one without it ever needing to
//! depend back on either of them.

use std::path::{Path, PathBuf};

use lsp_types::Url;

/// An attribute value as seen by the caller's own expression evaluator:
/// either a plain string literal, or something that would require
/// dynamic evaluation (variable reference, conditional, function call,
/// template interpolation, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Literal(String),
    NonLiteral,
}

impl RefValue {
    pub fn literal(&self) -> Option<&str> {
        match self {
            RefValue::Literal(value) => Some(value.as_str()),
            RefValue::NonLiteral => None,
        }
    }
}

/// The folder a Bake/Compose document's relative paths resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseFolder {
    pub native: String,
    pub wsl_distro: Option<String>,
}

/// The outcome of resolving a target/service's build context to a
/// Dockerfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerfileRef {
    /// `dockerfile-inline` was set: there is no file to point at.
    Inline,
    /// A concrete Dockerfile was found at this location.
    Resolved { uri: Url, native_path: String },
    /// `context`/`dockerfile` is not a literal and no external resolver
    /// is available. Not an error; it just disables this particular
    /// check.
    Unresolvable,
}

/// The attributes of a single Bake target or Compose service `build`
/// block, already reduced to [`RefValue`]s by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildRef {
    pub context: Option<RefValue>,
    pub dockerfile: Option<RefValue>,
    pub dockerfile_inline: bool,
}

/// Resolves a single target/service's Dockerfile reference. Recursing
/// through a Bake `inherits` chain is the caller's responsibility:
/// flatten the chain to a single
/// effective [`BuildRef`] - the first ancestor with a non-literal
/// `context`/`dockerfile` taints the whole chain - before calling this.
pub fn resolve_dockerfile_ref(base: &BaseFolder, build: &BuildRef) -> DockerfileRef {
    if build.dockerfile_inline {
        return DockerfileRef::Inline;
    }

    match (&build.context, &build.dockerfile) {
        (Some(context), Some(dockerfile)) => {
            let (Some(context), Some(dockerfile)) = (context.literal(), dockerfile.literal()) else {
                return DockerfileRef::Unresolvable;
            };
            let folder = join_folder(base, context);
            resolve(&folder, dockerfile)
        }
        (None, Some(dockerfile)) => {
            let Some(dockerfile) = dockerfile.literal() else {
                return DockerfileRef::Unresolvable;
            };
            resolve(base, dockerfile)
        }
        (Some(context), None) => {
            let Some(context) = context.literal() else {
                return DockerfileRef::Unresolvable;
            };
            let folder = join_folder(base, context);
            resolve(&folder, "Dockerfile")
        }
        (None, None) => resolve(base, "Dockerfile"),
    }
}

fn join_folder(base: &BaseFolder, context: &str) -> BaseFolder {
    let context_path = Path::new(context);
    let native = if context_path.is_absolute() {
        context.to_string()
    } else {
        normalize(&Path::new(&base.native).join(context_path))
            .to_string_lossy()
            .into_owned()
    };
    BaseFolder {
        native,
        wsl_distro: base.wsl_distro.clone(),
    }
}

fn resolve(folder: &BaseFolder, file: &str) -> DockerfileRef {
    let (uri, native_path) = dls_core::uri::concatenate(&folder.native, file, folder.wsl_distro.as_deref());
    DockerfileRef::Resolved { uri, native_path }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseFolder {
        BaseFolder {
            native: "/workspace/app".to_string(),
            wsl_distro: None,
        }
    }

    #[test]
    fn neither_context_nor_dockerfile_defaults_to_folder_slash_dockerfile() {
        let result = resolve_dockerfile_ref(&base(), &BuildRef::default());
        match result {
            DockerfileRef::Resolved { native_path, .. } => {
                assert_eq!(native_path, "/workspace/app/Dockerfile");
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn only_context_literal_joins_with_default_dockerfile_name() {
        let build = BuildRef {
            context: Some(RefValue::Literal("backend".to_string())),
            ..Default::default()
        };
        let result = resolve_dockerfile_ref(&base(), &build);
        match result {
            DockerfileRef::Resolved { native_path, .. } => {
                assert_eq!(native_path, "/workspace/app/backend/Dockerfile");
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn only_dockerfile_literal_joins_with_base_folder() {
        let build = BuildRef {
            dockerfile: Some(RefValue::Literal("Dockerfile.prod".to_string())),
            ..Default::default()
        };
        let result = resolve_dockerfile_ref(&base(), &build);
        match result {
            DockerfileRef::Resolved { native_path, .. } => {
                assert_eq!(native_path, "/workspace/app/Dockerfile.prod");
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn both_literal_joins_context_then_dockerfile() {
        let build = BuildRef {
            context: Some(RefValue::Literal("services/api".to_string())),
            dockerfile: Some(RefValue::Literal("Dockerfile.dev".to_string())),
            ..Default::default()
        };
        let result = resolve_dockerfile_ref(&base(), &build);
        match result {
            DockerfileRef::Resolved { native_path, .. } => {
                assert_eq!(native_path, "/workspace/app/services/api/Dockerfile.dev");
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }

    #[test]
    fn dockerfile_inline_short_circuits() {
        let build = BuildRef {
            dockerfile_inline: true,
            context: Some(RefValue::Literal("ignored".to_string())),
            ..Default::default()
        };
        assert_eq!(resolve_dockerfile_ref(&base(), &build), DockerfileRef::Inline);
    }

    #[test]
    fn non_literal_context_is_unresolvable() {
        let build = BuildRef {
            context: Some(RefValue::NonLiteral),
            ..Default::default()
        };
        assert_eq!(resolve_dockerfile_ref(&base(), &build), DockerfileRef::Unresolvable);
    }

    #[test]
    fn absolute_context_overrides_base_folder() {
        let build = BuildRef {
            context: Some(RefValue::Literal("/elsewhere".to_string())),
            ..Default::default()
        };
        let result = resolve_dockerfile_ref(&base(), &build);
        match result {
            DockerfileRef::Resolved { native_path, .. } => {
                assert_eq!(native_path, "/elsewhere/Dockerfile");
            }
            other => panic!("expected Resolved, got {other:?}"),
        }
    }
}
