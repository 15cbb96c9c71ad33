/// The three file families this server understands.
///
/// Identifies which analyzer crate owns a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageIdentifier {
    Dockerfile,
    Bake,
    Compose,
}

impl LanguageIdentifier {
    /// Infers a language from a file name when the editor hasn't told us.
    ///
    /// `.hcl` is always Bake. Compose naming conventions
    /// (`compose.yaml`, `docker-compose.yml`, `*.compose.yaml`, ...) win
    /// over the Dockerfile fallback for YAML files; anything else
    /// (including a bare `Dockerfile` or `Dockerfile.<stage>`) is treated
    /// as a Dockerfile.
    pub fn infer(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".hcl") {
            return LanguageIdentifier::Bake;
        }
        if (lower.ends_with(".yaml") || lower.ends_with(".yml")) && is_compose_name(&lower) {
            return LanguageIdentifier::Compose;
        }
        LanguageIdentifier::Dockerfile
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageIdentifier::Dockerfile => "dockerfile",
            LanguageIdentifier::Bake => "bake",
            LanguageIdentifier::Compose => "compose",
        }
    }
}

fn is_compose_name(lower: &str) -> bool {
    let stem = lower
        .rsplit_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(lower);
    stem.contains("compose") || stem.contains("docker-compose")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_bake_from_hcl_suffix() {
        assert_eq!(LanguageIdentifier::infer("docker-bake.hcl"), LanguageIdentifier::Bake);
    }

    #[test]
    fn infers_compose_from_yaml_suffix() {
        assert_eq!(LanguageIdentifier::infer("docker-compose.yml"), LanguageIdentifier::Compose);
        assert_eq!(LanguageIdentifier::infer("compose.yaml"), LanguageIdentifier::Compose);
    }

    #[test]
    fn falls_back_to_dockerfile() {
        assert_eq!(LanguageIdentifier::infer("Dockerfile"), LanguageIdentifier::Dockerfile);
        assert_eq!(LanguageIdentifier::infer("Dockerfile.alpine"), LanguageIdentifier::Dockerfile);
    }

    #[test]
    fn non_compose_named_yaml_falls_back_to_dockerfile() {
        assert_eq!(LanguageIdentifier::infer("values.yaml"), LanguageIdentifier::Dockerfile);
    }
}
