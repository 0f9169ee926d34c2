//! The shared default flag set. Kept in its own test binary because the
//! root is fixed on first use.

use std::time::Duration;

use k8sflag::{global, FlagOptions};

mod common;
use common::{eventually, write_config};

#[test]
fn test_default_set_reads_env_root() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(global::ROOT_ENV, dir.path());
    write_config(dir.path(), "hello.name", "joe");

    let name = global::string("hello.name", "nobody", FlagOptions::new());
    let enabled = global::bool("feature.enabled", false, FlagOptions::new());
    let replicas = global::int("replicas", 1, FlagOptions::new());
    let timeout = global::duration("timeout", Some(Duration::from_secs(5)), FlagOptions::new());

    assert_eq!(name.get(), "joe");
    assert!(!enabled.get());
    assert_eq!(replicas.get(), 1);
    assert_eq!(timeout.get(), Some(Duration::from_secs(5)));
    assert_eq!(
        global::default_set().root(),
        dir.path().canonicalize().unwrap()
    );

    write_config(dir.path(), "feature.enabled", "t");
    assert!(eventually(|| enabled.get()));
}
