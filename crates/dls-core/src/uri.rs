//! Document URI and native path handling.
//!
//! Three URI flavors must round-trip losslessly: plain POSIX
//! `file:///...`, Windows drive-letter `file:///c%3A/...`, and WSL host
//! `file://wsl%24/<distro>/...`. This module is the single sanctioned
//! conversion point, callers never build a `Url` by hand.

use std::path::{Path, PathBuf};

use lsp_types::Url;
use percent_encoding::percent_decode_str;

const WSL_HOST: &str = "wsl%24";

/// The folder/file-name/WSL-host triple derived from a `DocumentURI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    /// Parent directory in native form (backslashes on a WSL host, the
    /// platform separator otherwise).
    pub folder: String,
    pub file_name: String,
    /// `Some(distro)` when the URI's host segment was `wsl%24/<distro>`.
    pub wsl_distro: Option<String>,
}

/// Converts a native path to a `file://` URI, decoding nothing and
/// re-encoding only what `Url` requires.
pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// Converts a `file://` URI back to a native path, handling plain POSIX,
/// Windows drive-letter, and WSL host forms.
pub fn uri_to_path(uri: &Url) -> Option<PathBuf> {
    if let Some(distro) = wsl_distro(uri) {
        let decoded = percent_decode_str(uri.path()).decode_utf8_lossy();
        let rest = decoded.trim_start_matches('/').replace('/', "\\");
        return Some(PathBuf::from(format!("\\\\wsl$\\{distro}\\{rest}")));
    }

    if let Ok(path) = uri.to_file_path() {
        return Some(path);
    }

    if uri.scheme() != "file" {
        return None;
    }
    let raw_path = uri.path();
    if raw_path.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(raw_path).decode_utf8_lossy();

    // Windows drive-letter form: `/c:/...` once percent-decoded.
    if let Some(stripped) = decoded.strip_prefix('/') {
        if stripped.len() >= 2 && stripped.as_bytes()[1] == b':' {
            return Some(PathBuf::from(stripped.replace('/', "\\")));
        }
    }

    Some(PathBuf::from(decoded.as_ref()))
}

/// `Some(distro)` if the URI's host is the WSL `$` pseudo-host.
fn wsl_distro(uri: &Url) -> Option<String> {
    if uri.scheme() != "file" {
        return None;
    }
    // `url` parses `file://wsl%24/<distro>/...` with host `wsl$` (decoded)
    // and the distro as the first path segment.
    let host = uri.host_str()?;
    if host != "wsl$" && host != WSL_HOST {
        return None;
    }
    let mut segments = uri.path_segments()?;
    let distro = segments.next()?.to_string();
    Some(distro)
}

/// Splits a URI into folder / file name / WSL-host triple.
pub fn document_path(uri: &Url) -> Option<DocumentPath> {
    if let Some(distro) = wsl_distro(uri) {
        let decoded = percent_decode_str(uri.path()).decode_utf8_lossy();
        let mut segments: Vec<&str> = decoded.trim_start_matches('/').split('/').collect();
        if segments.is_empty() {
            return None;
        }
        // First segment is the distro name, already captured.
        segments.remove(0);
        let file_name = segments.pop()?.to_string();
        let folder = format!("\\\\wsl$\\{distro}\\{}", segments.join("\\"));
        return Some(DocumentPath {
            folder,
            file_name,
            wsl_distro: Some(distro),
        });
    }

    let path = uri_to_path(uri)?;
    let file_name = path.file_name()?.to_string_lossy().into_owned();
    let folder = path.parent()?.to_string_lossy().into_owned();
    Some(DocumentPath {
        folder,
        file_name,
        wsl_distro: None,
    })
}

/// Resolves `rel` against `base`'s parent directory, returning a
/// canonical absolute native path. On Windows-flavored URIs the leading
/// slash before the drive letter is already stripped by [`uri_to_path`].
pub fn absolute_path(base: &Url, rel: &str) -> Option<PathBuf> {
    let folder = absolute_folder(base)?;
    Some(normalize(&folder.join(rel)))
}

/// Resolves `base`'s parent directory to a canonical absolute native path.
pub fn absolute_folder(base: &Url) -> Option<PathBuf> {
    let path = uri_to_path(base)?;
    path.parent().map(|p| normalize(p))
}

/// Lexically normalizes `.`/`..` components without touching the
/// filesystem (callers may be resolving paths that don't exist yet).
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

/// Produces both the URI and native-path representation of `folder/file`.
/// For a WSL host, the URI uses forward slashes under `wsl%24` and the
/// native path uses `\\wsl$\`.
pub fn concatenate(folder: &str, file: &str, wsl_distro: Option<&str>) -> (Url, String) {
    if let Some(distro) = wsl_distro {
        let folder_fwd = folder.replace('\\', "/");
        let folder_fwd = folder_fwd.trim_start_matches('/').trim_end_matches('/');
        let native = if folder_fwd.is_empty() {
            format!("\\\\wsl$\\{distro}\\{file}")
        } else {
            format!(
                "\\\\wsl$\\{distro}\\{}\\{file}",
                folder_fwd.replace('/', "\\")
            )
        };
        let uri_path = if folder_fwd.is_empty() {
            format!("file://{WSL_HOST}/{distro}/{file}")
        } else {
            format!("file://{WSL_HOST}/{distro}/{folder_fwd}/{file}")
        };
        let uri = Url::parse(&uri_path).unwrap_or_else(|_| {
            Url::parse(&format!("file://{WSL_HOST}/{distro}/{file}"))
                .expect("minimal wsl uri always parses")
        });
        return (uri, native);
    }

    let native_path = Path::new(folder).join(file);
    let uri = path_to_uri(&native_path)
        .unwrap_or_else(|| Url::parse("file:///").expect("fallback root uri always parses"));
    (uri, native_path.to_string_lossy().into_owned())
}

/// Normalizes well-known Git remote URL shapes to `host[:port]/path`,
/// stripped of a trailing `.git`/`/` and any credentials.
pub fn git_repository(remote: &str) -> Option<String> {
    let remote = remote.trim();
    if let Some(rest) = remote
        .strip_prefix("ssh://")
        .or_else(|| remote.strip_prefix("git://"))
        .or_else(|| remote.strip_prefix("http://"))
        .or_else(|| remote.strip_prefix("https://"))
    {
        let rest = rest.splitn(2, '@').last().unwrap_or(rest);
        return Some(canonicalize_host_path(rest));
    }

    // scp-like syntax: user@host:path
    if let Some((host_part, path_part)) = remote.split_once(':') {
        if !host_part.contains('/') {
            let host = host_part.rsplit('@').next().unwrap_or(host_part);
            return Some(canonicalize_host_path(&format!("{host}/{path_part}")));
        }
    }

    None
}

fn canonicalize_host_path(host_path: &str) -> String {
    let trimmed = host_path.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed.to_string()
}

/// Longest-prefix match of `uri` against the provided workspace folders.
/// Returns the matching folder, the file's absolute path, and its path
/// relative to that folder.
pub fn workspace_folder(uri: &Url, folders: &[Url]) -> Option<(Url, PathBuf, PathBuf)> {
    let abs = uri_to_path(uri)?;
    let mut best: Option<(usize, Url, PathBuf)> = None;
    for folder in folders {
        let Some(folder_path) = uri_to_path(folder) else {
            continue;
        };
        if abs.starts_with(&folder_path) {
            let depth = folder_path.components().count();
            let replace = best.as_ref().is_none_or(|(best_depth, _, _)| depth > *best_depth);
            if replace {
                best = Some((depth, folder.clone(), folder_path));
            }
        }
    }
    let (_, folder, folder_path) = best?;
    let rel = abs.strip_prefix(&folder_path).ok()?.to_path_buf();
    Some((folder, abs, rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_round_trip() {
        let uri = Url::parse("file:///home/user/project/Dockerfile").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert_eq!(path, PathBuf::from("/home/user/project/Dockerfile"));
    }

    #[test]
    fn windows_drive_letter_round_trip() {
        let uri = Url::parse("file:///c%3A/work/project/Dockerfile").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert_eq!(path.to_string_lossy(), "c:\\work\\project\\Dockerfile");
    }

    #[test]
    fn wsl_host_round_trip() {
        let uri = Url::parse("file://wsl%24/Ubuntu/home/user/Dockerfile").unwrap();
        let path = uri_to_path(&uri).unwrap();
        assert_eq!(path.to_string_lossy(), "\\\\wsl$\\Ubuntu\\home\\user\\Dockerfile");
    }

    #[test]
    fn concatenate_wsl_produces_matching_uri_and_native_path() {
        let (uri, native) = concatenate("/home/user/project", "Dockerfile", Some("Ubuntu"));
        assert_eq!(uri.as_str(), "file://wsl%24/Ubuntu/home/user/project/Dockerfile");
        assert_eq!(native, "\\\\wsl$\\Ubuntu\\home\\user\\project\\Dockerfile");
    }

    #[test]
    fn git_repository_normalizes_scp_and_ssh_forms() {
        assert_eq!(
            git_repository("git@github.com:docker/compose.git"),
            Some("github.com/docker/compose".to_string())
        );
        assert_eq!(
            git_repository("ssh://git@github.com/docker/compose.git"),
            Some("github.com/docker/compose".to_string())
        );
        assert_eq!(
            git_repository("https://github.com/docker/compose.git/"),
            Some("github.com/docker/compose".to_string())
        );
    }

    #[test]
    fn workspace_folder_picks_longest_prefix() {
        let outer = Url::parse("file:///workspace/").unwrap();
        let inner = Url::parse("file:///workspace/services/api/").unwrap();
        let file = Url::parse("file:///workspace/services/api/Dockerfile").unwrap();
        let (folder, _abs, rel) = workspace_folder(&file, &[outer, inner.clone()]).unwrap();
        assert_eq!(folder, inner);
        assert_eq!(rel, PathBuf::from("Dockerfile"));
    }
}
