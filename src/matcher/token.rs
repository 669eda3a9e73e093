//! Token-prefix and host-list matcher.
//!
//! A request matches when it carries a token (header `token`, falling back to
//! cookie `token`) starting with the configured prefix AND its host is in the
//! provisioned host list.

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::matcher::error::ProvisionResult;
use crate::matcher::host_list::HostList;
use crate::matcher::request::{request_host, MatchRequest};
use crate::matcher::{MatchOutcome, Matcher};
use crate::observability::metrics;
use crate::registry::{ModuleInfo, RegistryError};
use crate::replacer::Replacer;

/// Stable identifier used to look the module up in a registry.
pub const MODULE_ID: &str = "http.matchers.matchToken";

/// Header and cookie name carrying the token.
pub const TOKEN_FIELD: &str = "token";

/// Raw matcher parameters as they appear in configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TokenMatchConfig {
    /// Required token prefix (byte-wise).
    pub tokenprefix: String,

    /// Host patterns: exact names, `*` segments, `{placeholders}`.
    pub host: Vec<String>,
}

/// A provisioned token matcher. Immutable once built.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    prefix: String,
    hosts: HostList,
}

impl TokenMatcher {
    /// Validate and normalize the configuration.
    pub fn provision(config: TokenMatchConfig) -> ProvisionResult<Self> {
        let hosts = HostList::provision(config.host)?;

        tracing::info!(
            entries = hosts.len(),
            fuzzy = hosts.fuzzy_count(),
            exact = hosts.len() - hosts.fuzzy_count(),
            large = hosts.is_large(),
            "Token matcher provisioned"
        );
        metrics::record_host_entries(hosts.len());

        Ok(Self {
            prefix: config.tokenprefix,
            hosts,
        })
    }

    /// Registry entry for this module.
    pub fn module_info() -> ModuleInfo {
        ModuleInfo {
            id: MODULE_ID,
            new: |params| {
                let config: TokenMatchConfig =
                    serde_json::from_value(params).map_err(|source| RegistryError::InvalidParams {
                        module: MODULE_ID.to_string(),
                        source,
                    })?;
                let matcher: Arc<dyn Matcher> = Arc::new(TokenMatcher::provision(config)?);
                Ok(matcher)
            },
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn hosts(&self) -> &HostList {
        &self.hosts
    }
}

impl Matcher for TokenMatcher {
    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "module": MODULE_ID,
            "entries": self.hosts.len(),
            "fuzzy": self.hosts.fuzzy_count(),
            "large": self.hosts.is_large(),
            "hosts": self.hosts.entries(),
        })
    }

    fn evaluate(&self, req: &dyn MatchRequest, repl: &dyn Replacer) -> MatchOutcome {
        let Some(token) = request_token(req) else {
            return MatchOutcome::TokenMissing;
        };
        if !token.starts_with(self.prefix.as_bytes()) {
            return MatchOutcome::TokenRejected;
        }

        let hostport = req.host();
        if self.hosts.contains(request_host(&hostport), repl) {
            MatchOutcome::Matched
        } else {
            MatchOutcome::HostRejected
        }
    }
}

/// Token from the `token` header, or the `token` cookie when the header is
/// absent or empty.
fn request_token(req: &dyn MatchRequest) -> Option<Cow<'_, [u8]>> {
    match req.header(TOKEN_FIELD) {
        Some(token) if !token.is_empty() => Some(Cow::Borrowed(token)),
        _ => req.cookie(TOKEN_FIELD).map(|c| Cow::Owned(c.into_bytes())),
    }
}
