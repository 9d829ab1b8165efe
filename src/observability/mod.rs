//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handler / gateway / config
//!     → logging.rs (tracing subscriber, RUST_LOG filter)
//!     → metrics.rs (counters, histograms; Prometheus endpoint if configured)
//! ```
//!
//! Request ids flow through every log line emitted inside a request span.

pub mod logging;
pub mod metrics;
