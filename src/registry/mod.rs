//! Flag registry subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (flagset.rs):
//!     FlagSet::string/bool/int/duration
//!     → resolve root/name path
//!     → bind into routing table + watch parent directory (dynamic only)
//!     → synchronous initial load
//!     → Flag handle returned
//!
//! Updates (dispatch.rs):
//!     notify event (create / modify / remove)
//!     → channel → dispatch thread
//!     → look up binding by path
//!     → reparse or default
//!     → atomic swap of the flag's cell
//! ```
//!
//! # Design Decisions
//! - One dispatch thread per registry; events are applied one at a time
//! - Directories are watched rather than files, so a backing file that
//!   appears after startup is still picked up
//! - The shared default registry (global.rs) is lazily created

pub(crate) mod dispatch;
pub mod flagset;
pub mod global;

pub use flagset::FlagSet;
