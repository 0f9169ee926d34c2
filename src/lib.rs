//! Live-updating typed configuration flags backed by a directory of files.
//!
//! Each file under a root directory (typically a mounted ConfigMap volume)
//! holds the value of one setting. A [`FlagSet`] reads the file once when a
//! flag is registered and keeps the value current as the file changes.
//!
//! ```rust,no_run
//! use k8sflag::{FlagOptions, FlagSet};
//!
//! let config = FlagSet::new("/etc/config").expect("notify unavailable");
//! let name = config.string("hello.name", "nobody", FlagOptions::new());
//! let replicas = config.int("replicas", 1, FlagOptions::new().required());
//!
//! println!("Hello {}, running {} replicas", name.get(), replicas.get());
//! ```

pub mod config;
pub mod error;
pub mod flag;
pub mod observability;
pub mod registry;

pub use config::WatchConfig;
pub use error::{FlagError, FlagResult, ParseError};
pub use flag::{BoolFlag, DurationFlag, Flag, FlagOptions, FlagValue, IntFlag, StringFlag};
pub use registry::{global, FlagSet};
