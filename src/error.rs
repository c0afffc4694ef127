//! Error types surfaced by credential resolution and context management.

use thiserror::Error;

/// Errors the resolver and context registry raise to their callers.
///
/// Keychain failures never appear here; the adapter reports them as
/// `false` / `None` instead.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0}")]
    NoCredentialsFound(String),

    #[error("context not found: {0}")]
    ProfileNotFound(String),

    #[error("invalid context name: {0}")]
    InvalidProfileName(String),

    #[error("'{name}' matches several resources (ids: {}); use the numeric id instead", join_ids(.ids))]
    AmbiguousReference { name: String, ids: Vec<u64> },

    #[error("no resource named '{0}'")]
    ResourceNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience result alias for credential operations.
pub type Result<T> = std::result::Result<T, CredentialError>;
