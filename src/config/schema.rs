//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Conventional mount point of an orchestrator-managed config volume.
pub const DEFAULT_ROOT: &str = "/etc/config";

/// How a [`FlagSet`](crate::FlagSet) watches its root.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory holding one file per setting.
    pub root: PathBuf,

    /// Notification backend.
    pub backend: WatchBackend,

    /// Scan interval for the `poll` backend.
    pub poll_interval_ms: u64,

    /// Whether flags follow file edits unless registered as static.
    pub dynamic_by_default: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            backend: WatchBackend::Native,
            poll_interval_ms: 2000,
            dynamic_by_default: true,
        }
    }
}

impl WatchConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Filesystem notification backend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackend {
    /// inotify / FSEvents / ReadDirectoryChanges.
    #[default]
    Native,
    /// Periodic scans, for filesystems without native notifications.
    Poll,
}

/// Flag declarations consumed by the `k8sflag` binary.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FlagManifest {
    pub watch: WatchConfig,
    pub flags: Vec<FlagSpec>,
}

/// One declared flag.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlagSpec {
    /// Path of the backing file relative to the root.
    pub name: String,

    pub kind: FlagKind,

    /// Fallback value. Strings, booleans and integers use their TOML type;
    /// durations are written as literals such as `"30s"`.
    #[serde(default)]
    pub default: Option<toml::Value>,

    #[serde(default)]
    pub required: bool,

    /// Overrides `watch.dynamic_by_default` when set.
    #[serde(default)]
    pub dynamic: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlagKind {
    String,
    Bool,
    Int,
    Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_watch_config() {
        let config = WatchConfig::default();
        assert_eq!(config.root, PathBuf::from("/etc/config"));
        assert_eq!(config.backend, WatchBackend::Native);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(config.dynamic_by_default);
    }

    #[test]
    fn test_minimal_manifest() {
        let manifest: FlagManifest = toml::from_str(
            r#"
[[flags]]
name = "hello.name"
kind = "string"
default = "nobody"
"#,
        )
        .unwrap();
        assert_eq!(manifest.watch, WatchConfig::default());
        assert_eq!(manifest.flags.len(), 1);
        assert_eq!(manifest.flags[0].kind, FlagKind::String);
        assert!(!manifest.flags[0].required);
        assert_eq!(manifest.flags[0].dynamic, None);
    }

    #[test]
    fn test_poll_backend() {
        let manifest: FlagManifest = toml::from_str(
            r#"
[watch]
root = "/tmp/cfg"
backend = "poll"
poll_interval_ms = 100
"#,
        )
        .unwrap();
        assert_eq!(manifest.watch.backend, WatchBackend::Poll);
        assert_eq!(manifest.watch.poll_interval(), Duration::from_millis(100));
        assert!(manifest.watch.dynamic_by_default);
    }
}
