//! Manifest validation.
//!
//! # Responsibilities
//! - Reject duplicate and empty flag names
//! - Check that each default has the type its flag declares
//! - Report every problem, not just the first

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::{FlagKind, FlagManifest, FlagSpec};
use crate::flag::duration::parse_duration;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("flag name must not be empty")]
    EmptyName,

    #[error("flag {0} declared more than once")]
    Duplicate(String),

    #[error("flag {name}: default {value} is not a valid {kind:?}")]
    BadDefault {
        name: String,
        kind: FlagKind,
        value: String,
    },

    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

/// A manifest default converted to the flag's value type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedDefault {
    String(String),
    Bool(bool),
    Int(i64),
    Duration(Option<Duration>),
}

/// Validate a whole manifest.
pub fn validate_manifest(manifest: &FlagManifest) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if manifest.watch.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    for spec in &manifest.flags {
        if spec.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
            continue;
        }
        if !seen.insert(spec.name.as_str()) {
            errors.push(ValidationError::Duplicate(spec.name.clone()));
        }
        if let Err(e) = typed_default(spec) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert a spec's default, or the type's zero value when none is given.
pub fn typed_default(spec: &FlagSpec) -> Result<TypedDefault, ValidationError> {
    use toml::Value;

    let bad = |value: &Value| ValidationError::BadDefault {
        name: spec.name.clone(),
        kind: spec.kind,
        value: value.to_string(),
    };

    Ok(match (spec.kind, &spec.default) {
        (FlagKind::String, None) => TypedDefault::String(String::new()),
        (FlagKind::String, Some(Value::String(s))) => TypedDefault::String(s.clone()),
        (FlagKind::Bool, None) => TypedDefault::Bool(false),
        (FlagKind::Bool, Some(Value::Boolean(b))) => TypedDefault::Bool(*b),
        (FlagKind::Int, None) => TypedDefault::Int(0),
        (FlagKind::Int, Some(Value::Integer(i))) => TypedDefault::Int(*i),
        (FlagKind::Duration, None) => TypedDefault::Duration(None),
        (FlagKind::Duration, Some(Value::String(s))) => match parse_duration(s) {
            Some(d) => TypedDefault::Duration(Some(d)),
            None => return Err(bad(&Value::String(s.clone()))),
        },
        (_, Some(v)) => return Err(bad(v)),
    })
}
