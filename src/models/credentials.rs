//! Robot user/password credentials and where they came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

/// A Robot API user/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub user: String,
    pub password: Zeroizing<String>,
}

impl CredentialSet {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// On-disk and in-keychain shape of a Robot credential set.
///
/// Both fields are optional so a half-written or hand-edited document still
/// parses; it just does not count as usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl RobotDocument {
    /// Usable only when both fields are present and non-empty.
    pub fn to_credentials(&self) -> Option<CredentialSet> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(CredentialSet::new(user, password))
            }
            _ => None,
        }
    }
}

impl From<&CredentialSet> for RobotDocument {
    fn from(creds: &CredentialSet) -> Self {
        Self {
            user: Some(creds.user.clone()),
            password: Some(creds.password.to_string()),
        }
    }
}

/// Backend a secret was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Supplied by the caller, e.g. command-line flags.
    Explicit,
    Environment,
    Keychain,
    File,
    None,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialSource::Explicit => "explicit",
            CredentialSource::Environment => "environment",
            CredentialSource::Keychain => "keychain",
            CredentialSource::File => "file",
            CredentialSource::None => "none",
        };
        f.write_str(label)
    }
}

/// A credential set tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub credentials: CredentialSet,
    pub source: CredentialSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let creds = CredentialSet::new("alice", "hunter2");
        let out = format!("{:?}", creds);
        assert!(out.contains("alice"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn test_document_requires_both_fields() {
        let partial = RobotDocument {
            user: Some("bob".into()),
            password: None,
        };
        assert!(partial.to_credentials().is_none());

        let empty_password = RobotDocument {
            user: Some("bob".into()),
            password: Some(String::new()),
        };
        assert!(empty_password.to_credentials().is_none());

        let full = RobotDocument {
            user: Some("bob".into()),
            password: Some("x".into()),
        };
        assert_eq!(full.to_credentials(), Some(CredentialSet::new("bob", "x")));
    }

    #[test]
    fn test_empty_document_serializes_to_empty_object() {
        let json = serde_json::to_string(&RobotDocument::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&CredentialSource::Environment).unwrap();
        assert_eq!(json, "\"environment\"");
    }
}
