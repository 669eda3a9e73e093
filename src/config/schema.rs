//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::matcher::token::MODULE_ID;

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Where matched requests are forwarded. Without it the gate answers
    /// `200 OK` on a match (forward-auth mode).
    pub upstream: Option<UpstreamConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// The request matcher guarding the gate.
    pub matcher: MatcherConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream that receives matched requests.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UpstreamConfig {
    /// Upstream authority (e.g., "127.0.0.1:3000").
    pub address: String,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Matcher section: a module id plus its raw parameters.
///
/// ```toml
/// [matcher]
/// module = "http.matchers.matchToken"
/// tokenprefix = "abc"
/// host = ["example.com", "*.example.com"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MatcherConfig {
    /// Registry id of the matcher module.
    #[serde(default = "default_module")]
    pub module: String,

    /// Remaining keys, passed to the module untouched.
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

fn default_module() -> String {
    MODULE_ID.to_string()
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            module: default_module(),
            params: serde_json::Map::new(),
        }
    }
}

impl MatcherConfig {
    /// Parameters as a JSON object for the registry.
    pub fn params_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.params.clone())
    }
}
