//! Error types for flag registration and configuration loading.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::validation::ValidationError;

/// A raw file value that could not be parsed into a flag's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Not a boolean literal.
    #[error("invalid boolean {0:?}")]
    Bool(String),

    /// Not a base-10 signed integer.
    #[error("invalid integer {0:?}")]
    Int(String),

    /// Not a magnitude+unit duration literal.
    #[error("invalid duration {0:?}")]
    Duration(String),
}

/// Errors that can occur while constructing a registry or binding a flag.
#[derive(Debug, Error)]
pub enum FlagError {
    /// The filesystem notification subsystem could not be set up.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Another flag is already bound to the same file.
    #[error("flag {name} already bound to {}", .path.display())]
    AlreadyBound { name: String, path: PathBuf },

    /// A required flag has no readable backing file.
    #[error("flag {name} is required but {} could not be read", .path.display())]
    Required { name: String, path: PathBuf },

    /// A required flag's backing file does not parse.
    #[error("error reading {name}: {source}")]
    Invalid {
        name: String,
        #[source]
        source: ParseError,
    },

    /// The registry was closed before the flag was bound.
    #[error("flag set is closed")]
    Closed,
}

/// Result type for flag operations.
pub type FlagResult<T> = Result<T, FlagError>;

/// Errors from loading a flag manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Report an unrecoverable startup error and terminate the process.
///
/// Registration failures for required flags, duplicate bindings and a broken
/// notification subsystem all end up here when the non-`try` constructors
/// are used.
pub fn fatal(err: FlagError) -> ! {
    tracing::error!(error = %err, "fatal flag error");
    eprintln!("k8sflag: {err}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlagError::Required {
            name: "hello.name".into(),
            path: PathBuf::from("/etc/config/hello.name"),
        };
        assert_eq!(
            err.to_string(),
            "flag hello.name is required but /etc/config/hello.name could not be read"
        );

        let err = FlagError::Invalid {
            name: "replicas".into(),
            source: ParseError::Int("wrong".into()),
        };
        assert_eq!(err.to_string(), "error reading replicas: invalid integer \"wrong\"");
    }

    #[test]
    fn test_validation_display_joins_messages() {
        let err = ConfigError::Validation(vec![
            ValidationError::EmptyName,
            ValidationError::Duplicate("a".into()),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: flag name must not be empty, flag a declared more than once"
        );
    }
}
