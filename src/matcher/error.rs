//! Provisioning error definitions.

use thiserror::Error;

/// Errors that abort provisioning of a host list.
///
/// Both variants are configuration errors: a matcher that fails to provision
/// must never be published.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// A host entry could not be converted to its ASCII form.
    #[error("converting hostname '{host}' to ASCII: {reason}")]
    Encoding { host: String, reason: String },

    /// Two entries normalize to the same lowercase ASCII value.
    #[error("host at index {first} is repeated at index {index}: {host}")]
    DuplicateHost {
        first: usize,
        index: usize,
        host: String,
    },
}

/// Result type for provisioning.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
