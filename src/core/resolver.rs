//! Robot credential resolution.
//!
//! Sources are consulted in a fixed order and the first hit wins:
//! 1. explicit override (command-line flags)
//! 2. `HETZNER_ROBOT_USER` / `HETZNER_ROBOT_PASSWORD`
//! 3. OS keychain
//! 4. `credentials.json` in the config directory

use crate::constants;
use crate::core::env_probe::{self, EnvSource};
use crate::core::file_store::{Domain, FileStore};
use crate::core::keychain::Keychain;
use crate::error::{CredentialError, Result};
use crate::models::credentials::{
    CredentialSet, CredentialSource, ResolvedCredentials, RobotDocument,
};
use tracing::debug;

pub struct Resolver<'a> {
    env: &'a dyn EnvSource,
    keychain: &'a Keychain,
    store: &'a FileStore,
}

impl<'a> Resolver<'a> {
    pub fn new(env: &'a dyn EnvSource, keychain: &'a Keychain, store: &'a FileStore) -> Self {
        Self {
            env,
            keychain,
            store,
        }
    }

    /// Credentials for an authenticated Robot request.
    pub fn resolve(&self, explicit: Option<CredentialSet>) -> Result<ResolvedCredentials> {
        self.find(explicit)?
            .ok_or_else(|| CredentialError::NoCredentialsFound(no_credentials_message()))
    }

    /// Like `resolve`, but returns `None` instead of failing when nothing matches.
    pub fn query(&self, explicit: Option<CredentialSet>) -> Result<Option<ResolvedCredentials>> {
        self.find(explicit)
    }

    fn find(&self, explicit: Option<CredentialSet>) -> Result<Option<ResolvedCredentials>> {
        if let Some(credentials) = explicit {
            return Ok(Some(tagged(credentials, CredentialSource::Explicit)));
        }
        if let Some(credentials) = env_probe::robot_from_env(self.env) {
            debug!("robot credentials from environment");
            return Ok(Some(tagged(credentials, CredentialSource::Environment)));
        }
        if let Some(credentials) = self.from_keychain() {
            debug!("robot credentials from keychain");
            return Ok(Some(tagged(credentials, CredentialSource::Keychain)));
        }
        if let Some(credentials) = self.from_file()? {
            debug!("robot credentials from file");
            return Ok(Some(tagged(credentials, CredentialSource::File)));
        }
        Ok(None)
    }

    pub fn from_keychain(&self) -> Option<CredentialSet> {
        let raw = self.keychain.get(constants::ROBOT_ACCOUNT)?;
        match serde_json::from_str::<RobotDocument>(&raw) {
            Ok(doc) => doc.to_credentials(),
            Err(_) => {
                debug!("ignoring malformed keychain entry");
                None
            }
        }
    }

    pub fn from_file(&self) -> Result<Option<CredentialSet>> {
        let doc: RobotDocument = self.store.load(Domain::Robot)?;
        Ok(doc.to_credentials())
    }

    /// Store in the keychain. Returns `false` when the keychain refused.
    pub fn save_to_keychain(&self, credentials: &CredentialSet) -> bool {
        match serde_json::to_string(&RobotDocument::from(credentials)) {
            Ok(raw) => self.keychain.set(constants::ROBOT_ACCOUNT, &raw),
            Err(_) => false,
        }
    }

    pub fn save_to_file(&self, credentials: &CredentialSet) -> Result<()> {
        self.store
            .save(Domain::Robot, &RobotDocument::from(credentials))?;
        Ok(())
    }

    /// Persist to the keychain, falling back to the file.
    pub fn save(&self, credentials: &CredentialSet) -> Result<CredentialSource> {
        if self.save_to_keychain(credentials) {
            // The keychain copy is authoritative now; drop any older file copy.
            self.store.clear(Domain::Robot)?;
            return Ok(CredentialSource::Keychain);
        }
        self.save_to_file(credentials)?;
        Ok(CredentialSource::File)
    }

    /// Erase stored credentials from every backend that may hold them.
    pub fn clear(&self) -> Result<()> {
        self.keychain.delete(constants::ROBOT_ACCOUNT);
        self.store.clear(Domain::Robot)?;
        Ok(())
    }

    pub fn keychain(&self) -> &Keychain {
        self.keychain
    }

    pub fn store(&self) -> &FileStore {
        self.store
    }
}

fn tagged(credentials: CredentialSet, source: CredentialSource) -> ResolvedCredentials {
    ResolvedCredentials {
        credentials,
        source,
    }
}

fn no_credentials_message() -> String {
    format!(
        "no Robot credentials found. Set {} and {}, or run 'hetzner login'",
        constants::ENV_ROBOT_USER,
        constants::ENV_ROBOT_PASSWORD
    )
}
