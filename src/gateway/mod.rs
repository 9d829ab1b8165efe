//! Forwarding gateway.
//!
//! # Data Flow
//! ```text
//! finalized request (body already translated or passed through)
//!     → upstream.rs (scheme/authority from config, path + query joining)
//!     → headers.rs (Host, X-Forwarded-*, hop-by-hop stripping)
//!     → forward.rs (send upstream, stream response back)
//! ```
//!
//! There is exactly one upstream for the lifetime of the process and no
//! retries: a transport failure becomes a 502 for the caller.

pub mod forward;
pub mod headers;
pub mod upstream;

pub use forward::Forwarder;
pub use upstream::{Upstream, UpstreamError};
