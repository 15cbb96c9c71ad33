use lsp_types::Url;

/// Concrete error kinds this server's crates can produce.
///
/// `Unresolvable` and `NetworkFailure` intentionally have no variant here:
/// both are treated as non-errors that simply disable downstream checks,
/// so callers encode them as `Option::None` / a skipped check rather
/// than propagating a `Result::Err`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid document URI: {0}")]
    InvalidUri(String),

    #[error("document not found: {0}")]
    NotFound(Url),

    #[error("unrecognized body in {language} document")]
    InternalInvariant { language: &'static str },
}
