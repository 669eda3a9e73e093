//! Token and host-list request gate.
//!
//! A request passes when it carries a token with the configured prefix and
//! targets a host from a provisioned list of exact names, `*` wildcard
//! segments and `{placeholder}` patterns.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod matcher;
pub mod observability;
pub mod registry;
pub mod replacer;

pub use config::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use matcher::{MatchOutcome, Matcher, TokenMatcher};
pub use registry::MatcherRegistry;
