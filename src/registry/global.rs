//! Process-wide default flag set.
//!
//! Created on first use and rooted at `$K8SFLAG_ROOT`, or at
//! [`DEFAULT_ROOT`] when the variable is unset. Prefer constructing a
//! [`FlagSet`] and passing it around; these functions exist for programs
//! that declare their flags as statics.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::{WatchConfig, DEFAULT_ROOT};
use crate::error::fatal;
use crate::flag::{BoolFlag, DurationFlag, FlagOptions, IntFlag, StringFlag};
use crate::registry::FlagSet;

/// Environment variable overriding the default root.
pub const ROOT_ENV: &str = "K8SFLAG_ROOT";

static DEFAULT_SET: OnceLock<FlagSet> = OnceLock::new();

/// The shared flag set. Initialization happens exactly once even when
/// several threads race on first use; a failure there exits the process.
pub fn default_set() -> &'static FlagSet {
    DEFAULT_SET.get_or_init(|| {
        let root = std::env::var_os(ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
        FlagSet::with_config(WatchConfig::with_root(root)).unwrap_or_else(|e| fatal(e))
    })
}

/// Register a string flag on the default set. Exits the process on failure.
pub fn string(name: &str, default: impl Into<String>, options: FlagOptions) -> StringFlag {
    default_set().string(name, default, options)
}

/// Register a boolean flag on the default set. Exits the process on failure.
pub fn bool(name: &str, default: bool, options: FlagOptions) -> BoolFlag {
    default_set().bool(name, default, options)
}

/// Register an integer flag on the default set. Exits the process on failure.
pub fn int(name: &str, default: i64, options: FlagOptions) -> IntFlag {
    default_set().int(name, default, options)
}

/// Register a duration flag on the default set. Exits the process on failure.
pub fn duration(name: &str, default: Option<Duration>, options: FlagOptions) -> DurationFlag {
    default_set().duration(name, default, options)
}
