//! Manifest loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::FlagManifest;
use crate::config::validation::validate_manifest;
use crate::error::ConfigError;

/// Load and validate a flag manifest from a TOML file.
pub fn load_manifest(path: &Path) -> Result<FlagManifest, ConfigError> {
    let content = fs::read_to_string(path)?;
    let manifest: FlagManifest = toml::from_str(&content)?;

    validate_manifest(&manifest).map_err(ConfigError::Validation)?;

    tracing::debug!(path = %path.display(), flags = manifest.flags.len(), "Manifest loaded");
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.toml");
        fs::write(
            &path,
            r#"
[watch]
root = "/etc/config"

[[flags]]
name = "hello.name"
kind = "string"
default = "nobody"

[[flags]]
name = "hello.timeout"
kind = "duration"
required = true
dynamic = false
"#,
        )
        .unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.flags.len(), 2);
        assert!(manifest.flags[1].required);
        assert_eq!(manifest.flags[1].dynamic, Some(false));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.toml");
        fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(load_manifest(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.toml");
        fs::write(
            &path,
            r#"
[[flags]]
name = "x"
kind = "int"
default = "three"
"#,
        )
        .unwrap();
        let err = load_manifest(&path).unwrap_err();
        assert!(err.to_string().contains("flag x: default"));
    }
}
