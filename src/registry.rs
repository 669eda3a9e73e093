//! Matcher module registry.
//!
//! Modules are registered on an explicit registry object handed to the
//! server at startup. Building a module provisions it, so anything the
//! registry returns is ready to be published.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::matcher::{Matcher, ProvisionError, TokenMatcher};

/// Builds a provisioned matcher from raw JSON parameters.
pub type MatcherFactory = fn(serde_json::Value) -> Result<Arc<dyn Matcher>, RegistryError>;

/// Registration record for a matcher module.
#[derive(Clone, Copy)]
pub struct ModuleInfo {
    /// Stable module identifier, e.g. `http.matchers.matchToken`.
    pub id: &'static str,
    /// Constructor.
    pub new: MatcherFactory,
}

impl std::fmt::Debug for ModuleInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleInfo").field("id", &self.id).finish()
    }
}

/// Errors raised while building a module.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown matcher module '{0}'")]
    UnknownModule(String),

    #[error("invalid parameters for module '{module}': {source}")]
    InvalidParams {
        module: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
}

/// Registry of matcher modules keyed by id.
#[derive(Debug, Default, Clone)]
pub struct MatcherRegistry {
    modules: BTreeMap<&'static str, ModuleInfo>,
}

impl MatcherRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in modules.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TokenMatcher::module_info());
        registry
    }

    /// Register a module, returning the one it replaced, if any.
    pub fn register(&mut self, info: ModuleInfo) -> Option<ModuleInfo> {
        self.modules.insert(info.id, info)
    }

    pub fn get(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.get(id)
    }

    /// Registered module ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.modules.keys().copied()
    }

    /// Instantiate and provision the module `id` with `params`.
    pub fn build(&self, id: &str, params: serde_json::Value) -> Result<Arc<dyn Matcher>, RegistryError> {
        let info = self
            .get(id)
            .ok_or_else(|| RegistryError::UnknownModule(id.to_string()))?;
        (info.new)(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::token::MODULE_ID;
    use crate::matcher::{MatchOutcome, MatchRequest};
    use crate::replacer::Replacer;

    #[derive(Debug)]
    struct Never;

    impl Matcher for Never {
        fn evaluate(&self, _req: &dyn MatchRequest, _repl: &dyn Replacer) -> MatchOutcome {
            MatchOutcome::HostRejected
        }
    }

    #[test]
    fn test_defaults_contain_token_matcher() {
        let registry = MatcherRegistry::with_defaults();
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![MODULE_ID]);
        assert!(registry.get(MODULE_ID).is_some());
    }

    #[test]
    fn test_unknown_module() {
        let registry = MatcherRegistry::with_defaults();
        let err = registry.build("http.matchers.nope", serde_json::json!({})).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownModule(id) if id == "http.matchers.nope"));
    }

    #[test]
    fn test_provision_error_propagates() {
        let registry = MatcherRegistry::with_defaults();
        let err = registry
            .build(MODULE_ID, serde_json::json!({ "host": ["a.com", "A.com"] }))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Provision(ProvisionError::DuplicateHost { .. })));
        assert_eq!(
            err.to_string(),
            "provisioning failed: host at index 0 is repeated at index 1: A.com"
        );
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = MatcherRegistry::new();
        let previous = registry.register(ModuleInfo {
            id: "http.matchers.never",
            new: |_| {
                let matcher: Arc<dyn Matcher> = Arc::new(Never);
                Ok(matcher)
            },
        });
        assert!(previous.is_none());
        assert!(registry.build("http.matchers.never", serde_json::Value::Null).is_ok());
    }
}
