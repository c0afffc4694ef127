//! Turn a human-given identifier (numeric id or name) into a numeric id.

use crate::error::{CredentialError, Result};

/// A resource as returned by a name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedResource {
    pub id: u64,
    pub name: String,
}

/// Resolve `input` to a numeric id.
///
/// All-digit input is parsed directly and `lookup` is never called.
/// Otherwise `lookup` returns every resource matching the name; exactly one
/// match is required.
pub fn resolve_id<F>(input: &str, lookup: F) -> Result<u64>
where
    F: FnOnce(&str) -> Result<Vec<NamedResource>>,
{
    let input = input.trim();
    if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(id) = input.parse::<u64>() {
            return Ok(id);
        }
    }

    let matches = lookup(input)?;
    match matches.as_slice() {
        [] => Err(CredentialError::ResourceNotFound(input.to_string())),
        [only] => Ok(only.id),
        many => Err(CredentialError::AmbiguousReference {
            name: input.to_string(),
            ids: many.iter().map(|r| r.id).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(id: u64, name: &str) -> NamedResource {
        NamedResource {
            id,
            name: name.into(),
        }
    }

    #[test]
    fn test_numeric_input_skips_lookup() {
        let id = resolve_id("007", |_| panic!("lookup must not run")).unwrap();
        assert_eq!(id, 7);
    }

    #[test]
    fn test_single_match() {
        let id = resolve_id("my-server", |name| {
            assert_eq!(name, "my-server");
            Ok(vec![server(42, "my-server")])
        })
        .unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn test_multiple_matches_are_ambiguous() {
        let err = resolve_id("web", |_| Ok(vec![server(1, "web"), server(2, "web")])).unwrap_err();
        match err {
            CredentialError::AmbiguousReference { name, ids } => {
                assert_eq!(name, "web");
                assert_eq!(ids, vec![1, 2]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_match_is_not_found() {
        let err = resolve_id("ghost", |_| Ok(vec![])).unwrap_err();
        assert!(matches!(err, CredentialError::ResourceNotFound(ref n) if n == "ghost"));
    }

    #[test]
    fn test_oversized_number_is_treated_as_name() {
        let huge = "99999999999999999999999";
        let id = resolve_id(huge, |_| Ok(vec![server(5, huge)])).unwrap();
        assert_eq!(id, 5);
    }

    #[test]
    fn test_lookup_error_propagates() {
        let err = resolve_id("x", |_| {
            Err(CredentialError::Other(anyhow::anyhow!("api down")))
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "api down");
    }
}
