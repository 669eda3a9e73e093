//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → matcher section handed to the registry for provisioning
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → server rebuilds the matcher
//!     → atomic swap of the active matcher
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Matcher parameters stay raw here; provisioning owns their meaning

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{GateConfig, ListenerConfig, MatcherConfig, ObservabilityConfig, TimeoutConfig, UpstreamConfig};
