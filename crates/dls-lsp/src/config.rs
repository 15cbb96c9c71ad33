//! Per-workspace settings.
//!
//! Loaded from a `docker-language-server.toml` found by walking up from
//! the workspace root, or pushed by the client as a
//! `workspace/didChangeConfiguration` JSON payload. Missing or
//! unparseable files fall back to defaults with a `tracing::warn!`,
//! never a hard error.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = "docker-language-server.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub diagnostics: DiagnosticsConfig,
    pub network: NetworkConfig,
    pub formatting: FormattingConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsConfig {
    pub vulnerability_scanning: bool,
    pub bake_undefined_args: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub none: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStyle {
    Tabs,
    Spaces(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattingConfig {
    pub indent: IndentStyle,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            diagnostics: DiagnosticsConfig { vulnerability_scanning: true, bake_undefined_args: true },
            network: NetworkConfig { none: false },
            formatting: FormattingConfig { indent: IndentStyle::Spaces(2) },
        }
    }
}

impl ProjectConfig {
    /// Walks up from `root` looking for [`CONFIG_FILE_NAME`], applying
    /// `DOCKER_NETWORK_NONE` over whatever the file (or its absence)
    /// produced.
    pub fn load(root: &Path) -> Self {
        let mut config = match find_config_file(root) {
            Some(path) => match std::fs::read_to_string(&path) {
                Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                    warn!("failed to parse {}: {err}", path.display());
                    ProjectConfig::default()
                }),
                Err(err) => {
                    warn!("failed to read {}: {err}", path.display());
                    ProjectConfig::default()
                }
            },
            None => ProjectConfig::default(),
        };
        if network_none_env() {
            config.network.none = true;
        }
        config
    }

    fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut config = ProjectConfig::default();
        if let Some(diagnostics) = file.diagnostics {
            if let Some(value) = diagnostics.vulnerability_scanning {
                config.diagnostics.vulnerability_scanning = value;
            }
            if let Some(bake) = diagnostics.bake {
                if let Some(value) = bake.undefined_args {
                    config.diagnostics.bake_undefined_args = value;
                }
            }
        }
        if let Some(network) = file.network {
            if let Some(value) = network.none {
                config.network.none = value;
            }
        }
        if let Some(formatting) = file.formatting {
            if let Some(indent) = formatting.indent {
                config.formatting.indent = parse_indent(&indent).unwrap_or(config.formatting.indent);
            }
        }
        Ok(config)
    }

    /// Applies a `workspace/didChangeConfiguration` JSON payload over
    /// the current settings, leaving unset fields untouched.
    pub fn merge_json(&mut self, value: &serde_json::Value) {
        let Ok(file) = serde_json::from_value::<ConfigFile>(value.clone()) else {
            warn!("ignoring malformed didChangeConfiguration payload");
            return;
        };
        if let Some(diagnostics) = file.diagnostics {
            if let Some(value) = diagnostics.vulnerability_scanning {
                self.diagnostics.vulnerability_scanning = value;
            }
            if let Some(bake) = diagnostics.bake {
                if let Some(value) = bake.undefined_args {
                    self.diagnostics.bake_undefined_args = value;
                }
            }
        }
        if let Some(network) = file.network {
            if let Some(value) = network.none {
                self.network.none = value;
            }
        }
        if let Some(formatting) = file.formatting {
            if let Some(indent) = formatting.indent {
                if let Some(style) = parse_indent(&indent) {
                    self.formatting.indent = style;
                }
            }
        }
        if network_none_env() {
            self.network.none = true;
        }
    }
}

fn network_none_env() -> bool {
    std::env::var("DOCKER_NETWORK_NONE").map(|v| v == "true").unwrap_or(false)
}

fn parse_indent(raw: &str) -> Option<IndentStyle> {
    if raw == "tabs" {
        return Some(IndentStyle::Tabs);
    }
    let inner = raw.strip_prefix("spaces(")?.strip_suffix(')')?;
    inner.parse::<u32>().ok().map(IndentStyle::Spaces)
}

fn find_config_file(root: &Path) -> Option<PathBuf> {
    let mut current = Some(root.to_path_buf());
    while let Some(dir) = current {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        current = dir.parent().map(Path::to_path_buf);
    }
    None
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    diagnostics: Option<DiagnosticsFile>,
    network: Option<NetworkFile>,
    formatting: Option<FormattingFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DiagnosticsFile {
    vulnerability_scanning: Option<bool>,
    bake: Option<BakeDiagnosticsFile>,
}

#[derive(Debug, Deserialize, Default)]
struct BakeDiagnosticsFile {
    undefined_args: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct NetworkFile {
    none: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct FormattingFile {
    indent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_full() {
        let config = ProjectConfig::default();
        assert!(config.diagnostics.vulnerability_scanning);
        assert!(config.diagnostics.bake_undefined_args);
        assert!(!config.network.none);
        assert_eq!(config.formatting.indent, IndentStyle::Spaces(2));
    }

    #[test]
    fn parses_toml_overrides() {
        let toml = "[diagnostics]\nvulnerability_scanning = false\n\n[diagnostics.bake]\nundefined_args = false\n\n[network]\nnone = true\n\n[formatting]\nindent = \"tabs\"\n";
        let config = ProjectConfig::from_toml(toml).unwrap();
        assert!(!config.diagnostics.vulnerability_scanning);
        assert!(!config.diagnostics.bake_undefined_args);
        assert!(config.network.none);
        assert_eq!(config.formatting.indent, IndentStyle::Tabs);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let tmp = std::env::temp_dir().join("dls-config-test-missing");
        let _ = std::fs::create_dir_all(&tmp);
        let config = ProjectConfig::load(&tmp);
        assert_eq!(config, ProjectConfig::default());
    }
}
