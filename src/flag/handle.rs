//! Flag handles and the shared load/refresh policy.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::{FlagError, FlagResult};
use crate::flag::cell::ValueCell;
use crate::flag::value::FlagValue;
use crate::observability::metrics;

pub type StringFlag = Flag<String>;
pub type BoolFlag = Flag<bool>;
pub type IntFlag = Flag<i64>;
pub type DurationFlag = Flag<Option<Duration>>;

/// When a load happens. Failures of required flags are only errors at
/// registration; afterwards the running process keeps its last value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Register,
    Update,
}

/// A named, typed, live-updatable configuration value.
///
/// Cloning is cheap and every clone reads the same cell.
pub struct Flag<T: FlagValue> {
    inner: Arc<FlagInner<T>>,
}

pub(crate) struct FlagInner<T: FlagValue> {
    name: String,
    default: T,
    required: bool,
    cell: ValueCell<T>,
    /// Held for a whole read-then-store so a slow read can never overwrite
    /// the result of a later one.
    refresh_lock: Mutex<()>,
}

impl<T: FlagValue> Flag<T> {
    pub(crate) fn new(name: &str, default: T, required: bool) -> Self {
        Self {
            inner: Arc::new(FlagInner {
                name: name.to_string(),
                cell: ValueCell::new(default.clone()),
                default,
                required,
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    /// Current value. Never blocks.
    #[inline]
    pub fn get(&self) -> T {
        self.inner.cell.get()
    }

    /// Current value without copying it.
    pub fn load(&self) -> Arc<T> {
        self.inner.cell.load()
    }

    /// Setting name, relative to the registry root.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn default_value(&self) -> &T {
        &self.inner.default
    }

    pub fn is_required(&self) -> bool {
        self.inner.required
    }

    pub(crate) fn binding(&self) -> Arc<dyn Binding> {
        self.inner.clone()
    }
}

impl<T: FlagValue> Clone for Flag<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: FlagValue> fmt::Debug for Flag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.inner.name)
            .field("kind", &T::KIND)
            .field("value", &self.inner.cell)
            .field("required", &self.inner.required)
            .finish()
    }
}

/// Type-erased view of a flag held by the registry for event routing.
pub(crate) trait Binding: Send + Sync {
    fn name(&self) -> &str;

    /// Read `path` and store the parsed value or the default.
    fn refresh(&self, path: &Path, phase: Phase) -> FlagResult<()>;

    /// Current value rendered for display.
    fn display_value(&self) -> String;
}

impl<T: FlagValue> Binding for FlagInner<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn refresh(&self, path: &Path, phase: Phase) -> FlagResult<()> {
        let _serial = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    tracing::debug!(flag = %self.name, path = %path.display(), "No backing file");
                } else {
                    tracing::error!(
                        flag = %self.name,
                        path = %path.display(),
                        error = %e,
                        "Error reading file"
                    );
                }
                let err = FlagError::Required {
                    name: self.name.clone(),
                    path: path.to_path_buf(),
                };
                return self.fall_back(err, phase);
            }
        };

        match T::parse(&bytes) {
            Ok(value) => {
                tracing::info!(flag = %self.name, kind = T::KIND, value = ?value, "Set flag");
                self.cell.store(value);
                metrics::record_update(&self.name);
                Ok(())
            }
            Err(source) => {
                tracing::debug!(flag = %self.name, error = %source, "Unparsable flag content");
                let err = FlagError::Invalid {
                    name: self.name.clone(),
                    source,
                };
                self.fall_back(err, phase)
            }
        }
    }

    fn display_value(&self) -> String {
        self.cell.load().render()
    }
}

impl<T: FlagValue> FlagInner<T> {
    fn fall_back(&self, err: FlagError, phase: Phase) -> FlagResult<()> {
        if self.required {
            return match phase {
                Phase::Register => Err(err),
                Phase::Update => {
                    tracing::warn!(
                        flag = %self.name,
                        error = %err,
                        "Required flag unavailable, keeping last value"
                    );
                    Ok(())
                }
            };
        }

        tracing::info!(
            flag = %self.name,
            kind = T::KIND,
            value = ?self.default,
            "Set flag to default"
        );
        self.cell.store(self.default.clone());
        metrics::record_default(&self.name);
        Ok(())
    }
}
