//! Shared utilities for integration tests.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use k8sflag::FlagSet;
use tempfile::TempDir;

/// A fresh config directory and a flag set watching it.
#[allow(dead_code)]
pub fn temp_config() -> (FlagSet, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let set = FlagSet::new(dir.path()).unwrap();
    (set, dir)
}

pub fn write_config(dir: &Path, key: &str, value: &str) {
    let path = dir.join(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, value).unwrap();
}

#[allow(dead_code)]
pub fn remove_config(dir: &Path, key: &str) {
    fs::remove_file(dir.join(key)).unwrap();
}

/// Poll `check` until it passes or two seconds elapse.
pub fn eventually<F: Fn() -> bool>(check: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    check()
}

/// Give the dispatch loop time to apply anything it was going to apply.
#[allow(dead_code)]
pub fn settle() {
    thread::sleep(Duration::from_millis(200));
}
