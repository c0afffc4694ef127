//! JSON documents in the per-user config directory.
//!
//! Each credential domain owns exactly one document. Missing or unparseable
//! documents load as their default value; only unexpected I/O errors surface.

use crate::constants;
use crate::core::paths::ConfigPaths;
use crate::util::fs as config_fs;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Credential domain backed by its own document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Robot user/password.
    Robot,
    /// Cloud context registry.
    Cloud,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    paths: ConfigPaths,
}

impl FileStore {
    pub fn new(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn path(&self, domain: Domain) -> &Path {
        match domain {
            Domain::Robot => &self.paths.robot_file,
            Domain::Cloud => &self.paths.cloud_file,
        }
    }

    pub fn load<T>(&self, domain: Domain) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(domain);
        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no document, using defaults");
                return Ok(T::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read {}", path.display()));
            }
        };
        // Invalid UTF-8 is a decode failure like any other malformed JSON.
        match serde_json::from_slice(&content) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable document");
                Ok(T::default())
            }
        }
    }

    pub fn save<T: Serialize>(&self, domain: Domain, doc: &T) -> Result<()> {
        config_fs::ensure_dir(&self.paths.root, constants::CONFIG_DIR_MODE)?;
        let path = self.path(domain);
        let mut content = serde_json::to_string_pretty(doc)
            .with_context(|| format!("serialize {}", path.display()))?;
        content.push('\n');
        config_fs::write_atomic(path, content.as_bytes(), constants::CONFIG_FILE_MODE)?;
        debug!(path = %path.display(), "saved document");
        Ok(())
    }

    /// Overwrite the document with `{}`. No-op when it does not exist.
    pub fn clear(&self, domain: Domain) -> Result<()> {
        let path = self.path(domain);
        if !path.exists() {
            return Ok(());
        }
        config_fs::write_atomic(path, b"{}", constants::CONFIG_FILE_MODE)?;
        debug!(path = %path.display(), "cleared document");
        Ok(())
    }
}
