//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! manifest file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → FlagManifest (validated)
//!     → WatchConfig handed to FlagSet::with_config
//!     → FlagSpec entries registered by the binary
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal manifests
//! - Validation separates syntactic (serde) from semantic checks
//! - The library itself only needs `WatchConfig`; manifests exist for the
//!   `k8sflag` binary

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{FlagKind, FlagManifest, FlagSpec, WatchBackend, WatchConfig, DEFAULT_ROOT};
