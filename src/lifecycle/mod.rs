//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Enter executable dir → Load config → Log setup → Bind listener
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → server stops accepting → in-flight requests drain → Exit
//! ```
//!
//! Any startup error is fatal; the listener is only bound once the
//! configuration is known to be usable.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
