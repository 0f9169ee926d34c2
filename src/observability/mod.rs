//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! flag loads and the dispatch loop produce:
//!     → tracing events (info: value changes, debug: ignored events)
//!     → metrics.rs (update / default / watch error counters)
//!
//! Consumers:
//!     → logging.rs subscriber installed by the binary
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or exporter is left
//!   to the application
//! - Verbosity is a subscriber filter, not a registry option

pub mod logging;
pub mod metrics;
