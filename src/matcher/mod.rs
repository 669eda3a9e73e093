//! Request matching subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration load (once per config generation):
//!     TokenMatchConfig { tokenprefix, host[] }
//!     → host_list.rs (ASCII conversion, duplicate check, partition + sort)
//!     → TokenMatcher (immutable, shared via Arc)
//!
//! Per request:
//!     request.rs (token header/cookie, host without port)
//!     → token.rs (prefix check, short-circuits on failure)
//!     → host_list.rs (binary search, then fuzzy scan with placeholders resolved)
//!     → MatchOutcome
//! ```
//!
//! # Design Decisions
//! - All configuration errors surface at provisioning time
//! - Matching is pure: anomalies resolve to "no match", never to an error
//! - Placeholder resolution is an explicit argument, not ambient state

pub mod error;
pub mod host_list;
pub mod request;
pub mod token;

pub use error::{ProvisionError, ProvisionResult};
pub use host_list::HostList;
pub use request::MatchRequest;
pub use token::{TokenMatchConfig, TokenMatcher};

use crate::replacer::Replacer;

/// Result of evaluating a request, kept for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOutcome {
    /// Token accepted and host listed.
    Matched,
    /// No token header or cookie.
    TokenMissing,
    /// Token does not carry the required prefix.
    TokenRejected,
    /// Token accepted, host not listed.
    HostRejected,
}

impl MatchOutcome {
    pub fn is_match(self) -> bool {
        self == MatchOutcome::Matched
    }

    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchOutcome::Matched => "matched",
            MatchOutcome::TokenMissing => "token_missing",
            MatchOutcome::TokenRejected => "token_rejected",
            MatchOutcome::HostRejected => "host_rejected",
        }
    }
}

/// Trait for matching requests against a provisioned condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Summary of the provisioned state, for diagnostics.
    fn describe(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Evaluate the request and report why it did or did not match.
    fn evaluate(&self, req: &dyn MatchRequest, repl: &dyn Replacer) -> MatchOutcome;

    /// Returns true if the request matches this condition.
    fn matches(&self, req: &dyn MatchRequest, repl: &dyn Replacer) -> bool {
        self.evaluate(req, repl).is_match()
    }
}
