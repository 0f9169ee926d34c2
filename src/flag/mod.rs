//! Typed flags.
//!
//! # Data Flow
//! ```text
//! backing file bytes
//!     → value.rs (FlagValue::parse for String / bool / i64 / Option<Duration>)
//!     → handle.rs (store parsed value, or default on failure)
//!     → cell.rs (atomic swap of Arc<T>)
//!     → Flag::get() on any thread
//! ```
//!
//! # Design Decisions
//! - One generic `Flag<T>`; the four value types differ only in their parser
//! - Readers never lock: the cell is an `ArcSwap`
//! - Failures are absorbed into the default, except for required flags at
//!   registration time

pub mod cell;
pub mod duration;
pub mod handle;
pub mod options;
pub mod value;

pub use cell::ValueCell;
pub use handle::{BoolFlag, DurationFlag, Flag, IntFlag, StringFlag};
pub use options::FlagOptions;
pub use value::FlagValue;
