//! Named Cloud contexts.
//!
//! The registry document is loaded fresh for every operation, mutated, and
//! rewritten in full before returning. There is no locking: concurrent
//! invocations against the same config directory may lose an update.

use crate::constants;
use crate::core::env_probe::{self, EnvSource};
use crate::core::file_store::{Domain, FileStore};
use crate::core::keychain::Keychain;
use crate::error::{CredentialError, Result};
use crate::models::credentials::CredentialSource;
use crate::models::profile::{Profile, ProfileEntry, ProfileRegistry};
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// A Cloud token tagged with its source.
#[derive(Clone)]
pub struct ResolvedToken {
    pub token: Zeroizing<String>,
    pub source: CredentialSource,
    /// Context the token belongs to, when it came from one.
    pub context: Option<String>,
}

impl fmt::Debug for ResolvedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedToken")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .field("context", &self.context)
            .finish()
    }
}

pub struct ContextRegistry<'a> {
    env: &'a dyn EnvSource,
    keychain: &'a Keychain,
    store: &'a FileStore,
}

impl<'a> ContextRegistry<'a> {
    pub fn new(env: &'a dyn EnvSource, keychain: &'a Keychain, store: &'a FileStore) -> Self {
        Self {
            env,
            keychain,
            store,
        }
    }

    pub fn load(&self) -> Result<ProfileRegistry> {
        let mut registry: ProfileRegistry = self.store.load(Domain::Cloud)?;
        registry.normalize();
        Ok(registry)
    }

    fn save(&self, registry: &ProfileRegistry) -> Result<()> {
        self.store.save(Domain::Cloud, registry)?;
        Ok(())
    }

    /// Create or replace a context. Returns where the token was stored.
    pub fn create(&self, name: &str, token: &str) -> Result<CredentialSource> {
        if name.is_empty() {
            return Err(CredentialError::InvalidProfileName(
                "name cannot be empty".into(),
            ));
        }
        let mut registry = self.load()?;
        let account = constants::context_account(name);

        let (profile, stored_in) = if self.keychain.set(&account, token) {
            let profile = Profile {
                name: name.to_string(),
                token: None,
            };
            (profile, CredentialSource::Keychain)
        } else {
            warn!(context = name, "keychain unavailable, storing token in config file");
            // A previous keychain copy would shadow the inline token.
            self.keychain.delete(&account);
            let profile = Profile {
                name: name.to_string(),
                token: Some(token.to_string()),
            };
            (profile, CredentialSource::File)
        };

        registry.insert(profile);
        self.save(&registry)?;
        Ok(stored_in)
    }

    pub fn use_context(&self, name: &str) -> Result<()> {
        let mut registry = self.load()?;
        if !registry.contains(name) {
            return Err(CredentialError::ProfileNotFound(name.to_string()));
        }
        registry.active = Some(name.to_string());
        self.save(&registry)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let mut registry = self.load()?;
        if !registry.contains(name) {
            return Err(CredentialError::ProfileNotFound(name.to_string()));
        }
        self.keychain.delete(&constants::context_account(name));
        registry.remove(name);
        self.save(&registry)
    }

    pub fn list(&self) -> Result<Vec<ProfileEntry>> {
        Ok(self.load()?.entries())
    }

    pub fn active(&self) -> Result<Option<String>> {
        Ok(self.load()?.active)
    }

    /// Token for an authenticated Cloud request.
    ///
    /// Order: explicit override, `HETZNER_CLOUD_TOKEN`, then the active
    /// context's keychain entry followed by its inline token.
    pub fn resolve_token(&self, explicit: Option<String>) -> Result<ResolvedToken> {
        if let Some(token) = explicit.filter(|t| !t.is_empty()) {
            return Ok(ResolvedToken {
                token: Zeroizing::new(token),
                source: CredentialSource::Explicit,
                context: None,
            });
        }
        if let Some(token) = env_probe::cloud_token_from_env(self.env) {
            debug!("cloud token from environment");
            return Ok(ResolvedToken {
                token: Zeroizing::new(token),
                source: CredentialSource::Environment,
                context: None,
            });
        }

        let registry = self.load()?;
        let Some(profile) = registry.active_profile() else {
            return Err(CredentialError::NoCredentialsFound(format!(
                "no cloud token found. Set {} or run 'hetzner context create <name>'",
                constants::ENV_CLOUD_TOKEN
            )));
        };

        if let Some(token) = self
            .keychain
            .get(&constants::context_account(&profile.name))
            .filter(|t| !t.is_empty())
        {
            debug!(context = %profile.name, "cloud token from keychain");
            return Ok(ResolvedToken {
                token: Zeroizing::new(token),
                source: CredentialSource::Keychain,
                context: Some(profile.name.clone()),
            });
        }
        if let Some(token) = profile.inline_secret() {
            debug!(context = %profile.name, "cloud token from config file");
            return Ok(ResolvedToken {
                token: Zeroizing::new(token.to_string()),
                source: CredentialSource::File,
                context: Some(profile.name.clone()),
            });
        }

        Err(CredentialError::NoCredentialsFound(format!(
            "no cloud token found for active context '{}'. Recreate it with 'hetzner context create {}' or set {}",
            profile.name,
            profile.name,
            constants::ENV_CLOUD_TOKEN
        )))
    }

    /// Move inline tokens into the keychain. Returns the migrated contexts.
    ///
    /// A token whose keychain write fails stays inline, so no secret is lost.
    pub fn migrate_to_keychain(&self) -> Result<Vec<String>> {
        let mut registry = self.load()?;
        let mut migrated = Vec::new();
        for profile in registry.profiles.values_mut() {
            let Some(token) = profile.token.clone() else {
                continue;
            };
            if self
                .keychain
                .set(&constants::context_account(&profile.name), &token)
            {
                profile.token = None;
                migrated.push(profile.name.clone());
            }
        }
        if !migrated.is_empty() {
            self.save(&registry)?;
        }
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keychain::testing::MemoryBackend;
    use crate::core::paths::ConfigPaths;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: FileStore,
        mem: MemoryBackend,
        keychain: Keychain,
        env: HashMap<String, String>,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(ConfigPaths::from_root(dir.path().join("cfg")));
        let mem = MemoryBackend::default();
        let keychain = mem.keychain();
        Fixture {
            _dir: dir,
            store,
            mem,
            keychain,
            env: HashMap::new(),
        }
    }

    impl Fixture {
        fn registry(&self) -> ContextRegistry<'_> {
            ContextRegistry::new(&self.env, &self.keychain, &self.store)
        }
    }

    /// A secret never lives in the keychain and inline at the same time.
    fn assert_single_location(f: &Fixture) {
        let registry = f.registry().load().unwrap();
        for profile in registry.profiles.values() {
            let in_keychain = f
                .mem
                .value(&constants::context_account(&profile.name))
                .is_some();
            assert!(
                !(in_keychain && profile.inline_secret().is_some()),
                "context {} stored twice",
                profile.name
            );
        }
    }

    #[test]
    fn test_create_first_activates_second_does_not() {
        let f = fixture();
        f.registry().create("prod", "t1").unwrap();
        assert_eq!(f.registry().active().unwrap().as_deref(), Some("prod"));
        f.registry().create("dev", "t2").unwrap();
        assert_eq!(f.registry().active().unwrap().as_deref(), Some("prod"));
        assert_single_location(&f);
    }

    #[test]
    fn test_create_uses_keychain() {
        let f = fixture();
        let stored = f.registry().create("prod", "tok").unwrap();
        assert_eq!(stored, CredentialSource::Keychain);
        assert_eq!(f.mem.value("context:prod").as_deref(), Some("tok"));
        let registry = f.registry().load().unwrap();
        assert_eq!(registry.profiles["prod"].token, None);
    }

    #[test]
    fn test_create_falls_back_to_inline() {
        let f = fixture();
        f.mem.fail_writes.set(true);
        let stored = f.registry().create("prod", "tok").unwrap();
        assert_eq!(stored, CredentialSource::File);
        let registry = f.registry().load().unwrap();
        assert_eq!(registry.profiles["prod"].token.as_deref(), Some("tok"));
        assert_single_location(&f);
    }

    #[test]
    fn test_recreate_inline_removes_stale_keychain_copy() {
        let f = fixture();
        f.registry().create("prod", "old").unwrap();
        f.mem.fail_writes.set(true);
        f.registry().create("prod", "new").unwrap();
        assert_eq!(f.mem.value("context:prod"), None);
        let token = f.registry().resolve_token(None).unwrap();
        assert_eq!(token.token.as_str(), "new");
        assert_single_location(&f);
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let f = fixture();
        let err = f.registry().create("", "tok").unwrap_err();
        assert!(matches!(err, CredentialError::InvalidProfileName(_)));
    }

    #[test]
    fn test_use_unknown_is_not_found() {
        let f = fixture();
        f.registry().create("prod", "t").unwrap();
        let err = f.registry().use_context("nope").unwrap_err();
        assert!(matches!(err, CredentialError::ProfileNotFound(ref n) if n == "nope"));
        assert_eq!(f.registry().active().unwrap().as_deref(), Some("prod"));
    }

    #[test]
    fn test_use_switches_active() {
        let f = fixture();
        f.registry().create("prod", "t1").unwrap();
        f.registry().create("dev", "t2").unwrap();
        f.registry().use_context("dev").unwrap();
        assert_eq!(f.registry().active().unwrap().as_deref(), Some("dev"));
        let token = f.registry().resolve_token(None).unwrap();
        assert_eq!(token.token.as_str(), "t2");
        assert_eq!(token.context.as_deref(), Some("dev"));
    }

    #[test]
    fn test_delete_active_reassigns_then_clears() {
        let f = fixture();
        f.registry().create("prod", "t1").unwrap();
        f.registry().create("staging", "t2").unwrap();
        f.registry().delete("prod").unwrap();
        assert_eq!(f.registry().active().unwrap().as_deref(), Some("staging"));
        assert_eq!(f.mem.value("context:prod"), None);
        f.registry().delete("staging").unwrap();
        assert_eq!(f.registry().active().unwrap(), None);
        assert!(f.registry().list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let f = fixture();
        let err = f.registry().delete("ghost").unwrap_err();
        assert!(matches!(err, CredentialError::ProfileNotFound(_)));
    }

    #[test]
    fn test_delete_survives_keychain_failure() {
        let f = fixture();
        f.registry().create("prod", "t").unwrap();
        f.mem.fail_deletes.set(true);
        f.registry().delete("prod").unwrap();
        assert!(f.registry().list().unwrap().is_empty());
    }

    #[test]
    fn test_list_sorted_with_active_flag() {
        let f = fixture();
        f.registry().create("zeta", "t").unwrap();
        f.registry().create("alpha", "t").unwrap();
        let list = f.registry().list().unwrap();
        let names: Vec<_> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert!(list[1].active);
        assert!(!list[0].active);
    }

    #[test]
    fn test_env_token_wins_over_context() {
        let mut f = fixture();
        f.registry().create("prod", "from-keychain").unwrap();
        f.env
            .insert(constants::ENV_CLOUD_TOKEN.into(), "from-env".into());
        let token = f.registry().resolve_token(None).unwrap();
        assert_eq!(token.token.as_str(), "from-env");
        assert_eq!(token.source, CredentialSource::Environment);
    }

    #[test]
    fn test_explicit_token_wins_over_env() {
        let mut f = fixture();
        f.env
            .insert(constants::ENV_CLOUD_TOKEN.into(), "from-env".into());
        let token = f
            .registry()
            .resolve_token(Some("from-flag".into()))
            .unwrap();
        assert_eq!(token.token.as_str(), "from-flag");
        assert_eq!(token.source, CredentialSource::Explicit);
    }

    #[test]
    fn test_env_and_explicit_hits_read_no_lower_backend() {
        let mut f = fixture();
        // Any attempt to load the registry now fails.
        std::fs::create_dir_all(f.store.path(Domain::Cloud)).unwrap();
        f.env
            .insert(constants::ENV_CLOUD_TOKEN.into(), "from-env".into());

        let token = f.registry().resolve_token(None).unwrap();
        assert_eq!(token.source, CredentialSource::Environment);
        let token = f.registry().resolve_token(Some("from-flag".into())).unwrap();
        assert_eq!(token.source, CredentialSource::Explicit);
        assert_eq!(f.mem.reads.get(), 0);
    }

    #[test]
    fn test_keychain_read_failure_falls_back_to_inline() {
        let f = fixture();
        f.mem.fail_writes.set(true);
        f.registry().create("prod", "inline").unwrap();
        f.mem.fail_reads.set(true);
        let token = f.registry().resolve_token(None).unwrap();
        assert_eq!(token.token.as_str(), "inline");
        assert_eq!(token.source, CredentialSource::File);
    }

    #[test]
    fn test_no_active_context_is_error() {
        let f = fixture();
        let err = f.registry().resolve_token(None).unwrap_err();
        assert!(matches!(err, CredentialError::NoCredentialsFound(_)));
        assert!(err.to_string().contains("no cloud token found"));
    }

    #[test]
    fn test_missing_secret_names_active_context() {
        let f = fixture();
        f.registry().create("prod", "t").unwrap();
        f.mem.entries.borrow_mut().clear();
        let err = f.registry().resolve_token(None).unwrap_err();
        assert!(err.to_string().contains("'prod'"));
    }

    #[test]
    fn test_migrate_moves_inline_tokens() {
        let f = fixture();
        f.mem.fail_writes.set(true);
        f.registry().create("prod", "t1").unwrap();
        f.registry().create("dev", "t2").unwrap();
        f.mem.fail_writes.set(false);

        let migrated = f.registry().migrate_to_keychain().unwrap();
        assert_eq!(migrated, ["dev", "prod"]);
        assert_eq!(f.mem.value("context:prod").as_deref(), Some("t1"));
        let registry = f.registry().load().unwrap();
        assert!(registry.profiles.values().all(|p| p.token.is_none()));
        assert_single_location(&f);
    }

    #[test]
    fn test_migrate_keeps_inline_when_keychain_refuses() {
        let f = fixture();
        f.mem.fail_writes.set(true);
        f.registry().create("prod", "t1").unwrap();
        let migrated = f.registry().migrate_to_keychain().unwrap();
        assert!(migrated.is_empty());
        let registry = f.registry().load().unwrap();
        assert_eq!(registry.profiles["prod"].token.as_deref(), Some("t1"));
    }
}
