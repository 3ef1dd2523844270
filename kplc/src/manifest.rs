#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use std::fs;
use std::path::{Path, PathBuf};

use kpl_parse::CompileConfig;
use miette::Diagnostic;
use thiserror::Error;

pub const MANIFEST_NAME: &str = "kpl.toml";

#[derive(Debug, Error, Diagnostic)]
#[error("manifest error: {message}")]
#[diagnostic(code(kpl::manifest))]
pub struct ManifestError {
    pub message: String,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    compiler: Option<CompilerSection>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct CompilerSection {
    #[serde(default, alias = "max-ident-len")]
    max_ident_len: Option<usize>,

    #[serde(default, alias = "max-depth")]
    max_depth: Option<usize>,
}

/// Compiler settings taken from a manifest. Unset fields leave the
/// defaults alone.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedManifest {
    pub manifest_path: Option<PathBuf>,
    pub max_ident_len: Option<usize>,
    pub max_depth: Option<usize>,
}

impl ResolvedManifest {
    pub fn apply(&self, cfg: &mut CompileConfig) {
        if let Some(n) = self.max_ident_len {
            cfg.max_ident_len = n;
        }
        if let Some(n) = self.max_depth {
            cfg.max_depth = n;
        }
    }
}

/// `kpl.toml` in the directory of `source`, if there is one.
pub fn find_manifest(source: &Path) -> Option<PathBuf> {
    let dir = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let candidate = dir.join(MANIFEST_NAME);
    candidate.is_file().then_some(candidate)
}

pub fn load_manifest(path: &Path) -> Result<ResolvedManifest, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|e| ManifestError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let parsed: Manifest = toml::from_str(&raw).map_err(|e| ManifestError {
        message: format!("failed to parse {}: {e}", path.display()),
    })?;

    let section = parsed.compiler.unwrap_or_default();
    for (key, value) in [
        ("max_ident_len", section.max_ident_len),
        ("max_depth", section.max_depth),
    ] {
        if value == Some(0) {
            return Err(ManifestError {
                message: format!("{}: [compiler] {key} must be positive", path.display()),
            });
        }
    }

    Ok(ResolvedManifest {
        manifest_path: Some(path.to_path_buf()),
        max_ident_len: section.max_ident_len,
        max_depth: section.max_depth,
    })
}

/// An explicit `--config` file wins; otherwise look next to the source.
pub fn resolve_manifest(
    source: &Path,
    explicit: Option<&Path>,
) -> Result<ResolvedManifest, ManifestError> {
    match explicit {
        Some(path) => load_manifest(path),
        None => match find_manifest(source) {
            Some(path) => load_manifest(&path),
            None => Ok(ResolvedManifest::default()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_manifest_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "main.kpl", "program P; begin end.");
        let resolved = resolve_manifest(&src, None).unwrap();
        assert_eq!(resolved, ResolvedManifest::default());

        let mut cfg = CompileConfig::default();
        resolved.apply(&mut cfg);
        assert_eq!(cfg, CompileConfig::default());
    }

    #[test]
    fn manifest_next_to_source_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "main.kpl", "program P; begin end.");
        let manifest = write(dir.path(), MANIFEST_NAME, "[compiler]\nmax_ident_len = 8\n");

        let resolved = resolve_manifest(&src, None).unwrap();
        assert_eq!(resolved.manifest_path.as_deref(), Some(manifest.as_path()));
        assert_eq!(resolved.max_ident_len, Some(8));
        assert_eq!(resolved.max_depth, None);

        let mut cfg = CompileConfig::default();
        resolved.apply(&mut cfg);
        assert_eq!(cfg.max_ident_len, 8);
        assert_eq!(cfg.max_depth, CompileConfig::default().max_depth);
    }

    #[test]
    fn explicit_config_overrides_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(dir.path(), "main.kpl", "program P; begin end.");
        write(dir.path(), MANIFEST_NAME, "[compiler]\nmax_depth = 10\n");
        let other = write(dir.path(), "strict.toml", "[compiler]\nmax-depth = 3\n");

        let resolved = resolve_manifest(&src, Some(&other)).unwrap();
        assert_eq!(resolved.max_depth, Some(3));
    }

    #[test]
    fn bad_manifests_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let unknown = write(dir.path(), "a.toml", "[compiler]\nedition = \"2026\"\n");
        let zero = write(dir.path(), "b.toml", "[compiler]\nmax_depth = 0\n");
        let broken = write(dir.path(), "c.toml", "[compiler\n");

        assert!(load_manifest(&unknown).unwrap_err().message.contains("failed to parse"));
        assert!(load_manifest(&zero).unwrap_err().message.contains("must be positive"));
        assert!(load_manifest(&broken).is_err());
        assert!(load_manifest(&dir.path().join("absent.toml")).is_err());
    }
}
