//! HTTP gate subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → gate.rs (evaluate active matcher; 403 on no match)
//!     → forward.rs (send to upstream) or 200 OK in forward-auth mode
//!     → Send to client
//! ```

pub mod forward;
pub mod gate;
pub mod server;

pub use server::{ActiveMatcher, GateState, HttpServer, ServerError};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";
