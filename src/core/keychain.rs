//! Optional OS keychain capability.
//!
//! The native store is loaded lazily, at most once per `Keychain`. Every
//! failure (store missing, access denied, keychain locked) is collapsed into
//! "unavailable": callers only ever see `bool` or `Option`.

use crate::constants;
use std::cell::OnceCell;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("keychain unavailable: {0}")]
    Unavailable(String),

    #[error("keychain backend error: {0}")]
    Backend(String),
}

/// Raw secret storage keyed by account name within one service.
pub trait SecretBackend {
    /// `Ok(None)` when the entry does not exist.
    fn get(&self, account: &str) -> Result<Option<String>, KeychainError>;
    fn set(&self, account: &str, value: &str) -> Result<(), KeychainError>;
    /// Deleting a missing entry is not an error.
    fn delete(&self, account: &str) -> Result<(), KeychainError>;
}

/// Secret storage through the platform keychain (macOS Keychain, Windows
/// Credential Manager, Secret Service on Linux).
pub struct OsKeyring {
    service: String,
}

impl OsKeyring {
    pub fn load(service: impl Into<String>) -> Result<Self, KeychainError> {
        let service = service.into();
        // Building an entry fails fast when no platform store is compiled in.
        keyring::Entry::new(&service, constants::PROBE_ACCOUNT)
            .map_err(|e| KeychainError::Unavailable(e.to_string()))?;
        Ok(Self { service })
    }

    fn entry(&self, account: &str) -> Result<keyring::Entry, KeychainError> {
        keyring::Entry::new(&self.service, account)
            .map_err(|e| KeychainError::Backend(e.to_string()))
    }
}

impl SecretBackend for OsKeyring {
    fn get(&self, account: &str) -> Result<Option<String>, KeychainError> {
        match self.entry(account)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::Backend(e.to_string())),
        }
    }

    fn set(&self, account: &str, value: &str) -> Result<(), KeychainError> {
        self.entry(account)?
            .set_password(value)
            .map_err(|e| KeychainError::Backend(e.to_string()))
    }

    fn delete(&self, account: &str) -> Result<(), KeychainError> {
        match self.entry(account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::Backend(e.to_string())),
        }
    }
}

type Loader = Box<dyn Fn() -> Result<Box<dyn SecretBackend>, KeychainError>>;

/// Keychain capability handed to the resolver and the context registry.
pub struct Keychain {
    loader: Option<Loader>,
    backend: OnceCell<Option<Box<dyn SecretBackend>>>,
}

impl Keychain {
    /// Capability backed by the platform keychain under the app's service name.
    pub fn system() -> Self {
        Self::with_loader(|| {
            let backend = OsKeyring::load(constants::KEYCHAIN_SERVICE)?;
            Ok(Box::new(backend) as Box<dyn SecretBackend>)
        })
    }

    /// Capability whose backend is produced by `loader` on first use.
    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn SecretBackend>, KeychainError> + 'static,
    {
        Self {
            loader: Some(Box::new(loader)),
            backend: OnceCell::new(),
        }
    }

    /// Capability that is never available.
    pub fn disabled() -> Self {
        Self {
            loader: None,
            backend: OnceCell::new(),
        }
    }

    fn backend(&self) -> Option<&dyn SecretBackend> {
        self.backend
            .get_or_init(|| {
                let loader = self.loader.as_ref()?;
                match loader() {
                    Ok(backend) => Some(backend),
                    Err(e) => {
                        debug!(error = %e, "keychain not loaded");
                        None
                    }
                }
            })
            .as_deref()
    }

    /// Whether the keychain is usable right now.
    pub fn probe(&self) -> bool {
        let Some(backend) = self.backend() else {
            return false;
        };
        match backend.get(constants::PROBE_ACCOUNT) {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "keychain probe failed");
                false
            }
        }
    }

    /// Stored value, or `None` when missing or inaccessible.
    pub fn get(&self, account: &str) -> Option<String> {
        let backend = self.backend()?;
        match backend.get(account) {
            Ok(value) => value,
            Err(e) => {
                debug!(account, error = %e, "keychain read failed");
                None
            }
        }
    }

    /// Store a value. Returns `false` on any failure.
    pub fn set(&self, account: &str, value: &str) -> bool {
        let Some(backend) = self.backend() else {
            return false;
        };
        match backend.set(account, value) {
            Ok(()) => true,
            Err(e) => {
                debug!(account, error = %e, "keychain write failed");
                false
            }
        }
    }

    /// Best-effort removal.
    pub fn delete(&self, account: &str) {
        let Some(backend) = self.backend() else {
            return;
        };
        if let Err(e) = backend.delete(account) {
            debug!(account, error = %e, "keychain delete failed");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MemoryBackend;
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_disabled_is_never_available() {
        let kc = Keychain::disabled();
        assert!(!kc.probe());
        assert!(!kc.set("a", "b"));
        assert_eq!(kc.get("a"), None);
        kc.delete("a");
    }

    #[test]
    fn test_failed_load_is_not_retried() {
        let attempts = Rc::new(Cell::new(0u32));
        let counter = attempts.clone();
        let kc = Keychain::with_loader(move || {
            counter.set(counter.get() + 1);
            Err(KeychainError::Unavailable("no platform store".into()))
        });
        assert!(!kc.probe());
        assert!(!kc.set("a", "b"));
        assert_eq!(kc.get("a"), None);
        kc.delete("a");
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_successful_load_happens_once() {
        let attempts = Rc::new(Cell::new(0u32));
        let counter = attempts.clone();
        let mem = MemoryBackend::default();
        let backend = mem.clone();
        let kc = Keychain::with_loader(move || {
            counter.set(counter.get() + 1);
            Ok(Box::new(backend.clone()) as Box<dyn SecretBackend>)
        });
        assert!(kc.set("a", "1"));
        assert_eq!(kc.get("a").as_deref(), Some("1"));
        assert!(kc.probe());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_locked_keychain_probes_false() {
        let mem = MemoryBackend::default();
        mem.fail_reads.set(true);
        let kc = mem.keychain();
        assert!(!kc.probe());
    }

    #[test]
    fn test_read_failure_reads_as_missing() {
        let mem = MemoryBackend::default();
        mem.insert("a", "1");
        mem.fail_reads.set(true);
        assert_eq!(mem.keychain().get("a"), None);
    }

    #[test]
    fn test_write_failure_returns_false() {
        let mem = MemoryBackend::default();
        mem.fail_writes.set(true);
        assert!(!mem.keychain().set("a", "1"));
        assert_eq!(mem.value("a"), None);
    }

    #[test]
    fn test_delete_swallows_failure() {
        let mem = MemoryBackend::default();
        mem.insert("a", "1");
        mem.fail_deletes.set(true);
        mem.keychain().delete("a");
        assert_eq!(mem.value("a").as_deref(), Some("1"));
    }
}
