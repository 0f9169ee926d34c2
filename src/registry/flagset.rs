//! The flag registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::WatchConfig;
use crate::error::{fatal, FlagError, FlagResult};
use crate::flag::handle::{Binding, Phase};
use crate::flag::{BoolFlag, DurationFlag, Flag, FlagOptions, FlagValue, IntFlag, StringFlag};
use crate::registry::dispatch::{self, Bindings, Dispatch, Watches};

/// Owns a watched configuration root and every flag bound under it.
///
/// Registration may happen from any thread, though in practice flags are
/// declared once at startup. The dispatch loop runs until [`close`] is
/// called or the set is dropped.
///
/// [`close`]: FlagSet::close
pub struct FlagSet {
    root: PathBuf,
    config: WatchConfig,
    /// Every registered flag, static or dynamic.
    registered: DashMap<PathBuf, Arc<dyn Binding>>,
    /// Dynamic flags only; shared with the dispatch loop.
    bindings: Bindings,
    /// Shared with the dispatch loop, which follows directories that
    /// appear after registration.
    watches: Arc<Watches>,
    events: mpsc::UnboundedSender<Dispatch>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl FlagSet {
    /// Create a registry for `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> FlagResult<Self> {
        Self::with_config(WatchConfig::with_root(root))
    }

    /// Create a registry and start its dispatch loop.
    pub fn with_config(config: WatchConfig) -> FlagResult<Self> {
        let root = resolve_root(&config.root);
        let (tx, rx) = mpsc::unbounded_channel();
        let watches = Arc::new(Watches::new(dispatch::build_watcher(&config, tx.clone())?));
        let bindings: Bindings = Arc::default();
        let dispatcher = dispatch::spawn(bindings.clone(), watches.clone(), rx)
            .map_err(|e| FlagError::Watch(notify::Error::io(e)))?;

        let set = Self {
            root,
            config,
            registered: DashMap::new(),
            bindings,
            watches,
            events: tx,
            dispatcher: Mutex::new(Some(dispatcher)),
            closed: AtomicBool::new(false),
        };

        // Watch the root itself so files created later are noticed. A root
        // that does not exist yet is picked up when it is created.
        set.watches.watch_nearest(&set.root);

        tracing::info!(
            root = %set.root.display(),
            backend = ?set.config.backend,
            "Flag set watching"
        );
        Ok(set)
    }

    /// The watched root, canonicalized when it existed at construction.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Absolute path of the file backing `name`.
    ///
    /// `name` is split on `/` so nested settings live in subdirectories.
    /// Empty, `.` and `..` segments are dropped so a name can never escape
    /// the root.
    pub fn path_of(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        name.split('/')
            .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
            .for_each(|seg| path.push(seg));
        path
    }

    /// Register a flag of any value type, returning an error instead of
    /// terminating the process.
    pub fn try_flag<T: FlagValue>(
        &self,
        name: &str,
        default: T,
        options: FlagOptions,
    ) -> FlagResult<Flag<T>> {
        let flag = Flag::new(name, default, options.required);
        self.bind(name, flag.binding(), options.is_dynamic(self.config.dynamic_by_default))?;
        Ok(flag)
    }

    /// Register a flag of any value type. Exits the process on failure.
    pub fn flag<T: FlagValue>(&self, name: &str, default: T, options: FlagOptions) -> Flag<T> {
        self.try_flag(name, default, options).unwrap_or_else(|e| fatal(e))
    }

    /// Register a string flag. Exits the process on failure.
    pub fn string(&self, name: &str, default: impl Into<String>, options: FlagOptions) -> StringFlag {
        self.flag(name, default.into(), options)
    }

    /// Register a boolean flag. Exits the process on failure.
    pub fn bool(&self, name: &str, default: bool, options: FlagOptions) -> BoolFlag {
        self.flag(name, default, options)
    }

    /// Register an integer flag. Exits the process on failure.
    pub fn int(&self, name: &str, default: i64, options: FlagOptions) -> IntFlag {
        self.flag(name, default, options)
    }

    /// Register a duration flag. Exits the process on failure.
    ///
    /// `None` as the default means "no default": missing or unparsable
    /// content then reads as `None`.
    pub fn duration(
        &self,
        name: &str,
        default: Option<Duration>,
        options: FlagOptions,
    ) -> DurationFlag {
        self.flag(name, default, options)
    }

    /// Register a string flag, returning an error on failure.
    pub fn try_string(
        &self,
        name: &str,
        default: impl Into<String>,
        options: FlagOptions,
    ) -> FlagResult<StringFlag> {
        self.try_flag(name, default.into(), options)
    }

    /// Register a boolean flag, returning an error on failure.
    pub fn try_bool(&self, name: &str, default: bool, options: FlagOptions) -> FlagResult<BoolFlag> {
        self.try_flag(name, default, options)
    }

    /// Register an integer flag, returning an error on failure.
    pub fn try_int(&self, name: &str, default: i64, options: FlagOptions) -> FlagResult<IntFlag> {
        self.try_flag(name, default, options)
    }

    /// Register a duration flag, returning an error on failure.
    pub fn try_duration(
        &self,
        name: &str,
        default: Option<Duration>,
        options: FlagOptions,
    ) -> FlagResult<DurationFlag> {
        self.try_flag(name, default, options)
    }

    fn bind(&self, name: &str, binding: Arc<dyn Binding>, dynamic: bool) -> FlagResult<()> {
        if self.is_closed() {
            return Err(FlagError::Closed);
        }

        let path = self.path_of(name);
        match self.registered.entry(path.clone()) {
            Entry::Occupied(_) => {
                return Err(FlagError::AlreadyBound {
                    name: name.to_string(),
                    path,
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(binding.clone());
            }
        }

        // Route events before the first read so an edit racing with
        // registration is not lost.
        if dynamic {
            self.bindings.insert(path.clone(), binding.clone());
            if let Some(dir) = path.parent() {
                self.watches.watch_nearest(dir);
            }
        }

        if let Err(e) = binding.refresh(&path, Phase::Register) {
            self.bindings.remove(&path);
            self.registered.remove(&path);
            return Err(e);
        }

        tracing::debug!(flag = %name, path = %path.display(), dynamic, "Flag bound");
        Ok(())
    }

    /// Names of all registered flags, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registered
            .iter()
            .map(|b| b.value().name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Current value of every registered flag, rendered for display.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        let mut values: Vec<(String, String)> = self
            .registered
            .iter()
            .map(|b| (b.value().name().to_string(), b.value().display_value()))
            .collect();
        values.sort();
        values
    }

    /// Whether a dynamic flag is bound to `name`.
    pub fn is_watched(&self, name: &str) -> bool {
        self.bindings.contains_key(&self.path_of(name))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop watching. Flags keep their last value and stop updating.
    ///
    /// Events already queued are applied before the loop exits.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.watches.shutdown();
        let _ = self.events.send(Dispatch::Stop);

        if let Some(handle) = lock(&self.dispatcher).take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::error!("Dispatch loop panicked");
            }
        }
        tracing::info!(root = %self.root.display(), "Flag set closed");
    }
}

impl Drop for FlagSet {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagSet")
            .field("root", &self.root)
            .field("flags", &self.names())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Event paths are reported relative to what was watched, so use the
/// canonical form when the root exists.
fn resolve_root(root: &Path) -> PathBuf {
    root.canonicalize().unwrap_or_else(|_| root.to_path_buf())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_set() -> (FlagSet, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let set = FlagSet::new(dir.path()).unwrap();
        (set, dir)
    }

    #[test]
    fn test_path_of_nested_name() {
        let (set, dir) = temp_set();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(set.path_of("hello.name"), root.join("hello.name"));
        assert_eq!(set.path_of("db/host"), root.join("db").join("host"));
        assert_eq!(set.path_of("/../etc/passwd"), root.join("etc").join("passwd"));
    }

    #[test]
    fn test_duplicate_binding_is_rejected() {
        let (set, _dir) = temp_set();
        set.try_string("name", "nobody", FlagOptions::new()).unwrap();
        let err = set.try_int("name", 0, FlagOptions::new()).unwrap_err();
        assert!(matches!(err, FlagError::AlreadyBound { .. }));

        // Static flags claim their path too.
        set.try_bool("static", false, FlagOptions::new().static_value())
            .unwrap();
        assert!(set.try_bool("static", false, FlagOptions::new()).is_err());
    }

    #[test]
    fn test_failed_registration_releases_path() {
        let (set, dir) = temp_set();
        assert!(set
            .try_string("name", "", FlagOptions::new().required())
            .is_err());
        assert!(!set.is_watched("name"));

        fs::write(dir.path().join("name"), "joe").unwrap();
        let flag = set
            .try_string("name", "", FlagOptions::new().required())
            .unwrap();
        assert_eq!(flag.get(), "joe");
    }

    #[test]
    fn test_static_flags_are_not_watched() {
        let (set, _dir) = temp_set();
        set.try_int("a", 1, FlagOptions::new()).unwrap();
        set.try_int("b", 2, FlagOptions::new().static_value()).unwrap();
        assert!(set.is_watched("a"));
        assert!(!set.is_watched("b"));
        assert_eq!(set.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_registry_default_can_be_static() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatchConfig {
            dynamic_by_default: false,
            ..WatchConfig::with_root(dir.path())
        };
        let set = FlagSet::with_config(config).unwrap();
        set.try_int("a", 1, FlagOptions::new()).unwrap();
        set.try_int("b", 1, FlagOptions::new().dynamic()).unwrap();
        assert!(!set.is_watched("a"));
        assert!(set.is_watched("b"));
    }

    #[test]
    fn test_snapshot_renders_values() {
        let (set, dir) = temp_set();
        fs::write(dir.path().join("timeout"), "5m").unwrap();
        set.try_duration("timeout", None, FlagOptions::new()).unwrap();
        set.try_string("name", "nobody", FlagOptions::new()).unwrap();
        assert_eq!(
            set.snapshot(),
            vec![
                ("name".to_string(), "nobody".to_string()),
                ("timeout".to_string(), "300s".to_string()),
            ]
        );
    }

    #[test]
    fn test_closed_set_rejects_registration() {
        let (set, _dir) = temp_set();
        set.close();
        set.close();
        assert!(set.is_closed());
        assert!(matches!(
            set.try_string("name", "", FlagOptions::new()),
            Err(FlagError::Closed)
        ));
    }
}
