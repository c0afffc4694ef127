//! Named Cloud contexts and the registry that tracks the active one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named Cloud context.
///
/// `token` holds the secret inline only when the keychain write failed at
/// creation time; otherwise the secret lives in the keychain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Profile {
    /// Token stored in the config file, ignoring empty strings.
    pub fn inline_secret(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Persisted registry of contexts plus the active pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRegistry {
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// One row of `list()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    pub name: String,
    pub active: bool,
}

impl ProfileRegistry {
    /// Repair a loaded document so the registry invariants hold.
    ///
    /// Entries written without a `name` take it from their key, and an
    /// `active` pointer to a missing context is reassigned. A null `active`
    /// is left alone even when contexts exist.
    pub fn normalize(&mut self) {
        for (key, profile) in self.profiles.iter_mut() {
            if profile.name != *key {
                profile.name = key.clone();
            }
        }
        let dangling = match self.active.as_deref() {
            Some(name) => !self.profiles.contains_key(name),
            None => false,
        };
        if dangling {
            self.active = self.profiles.keys().next().cloned();
        }
    }

    /// Insert or replace a context. The first context becomes active.
    pub fn insert(&mut self, profile: Profile) {
        let was_empty = self.profiles.is_empty();
        let name = profile.name.clone();
        self.profiles.insert(name.clone(), profile);
        if was_empty {
            self.active = Some(name);
        }
    }

    /// Remove a context, moving the active pointer if it pointed here.
    pub fn remove(&mut self, name: &str) -> Option<Profile> {
        let removed = self.profiles.remove(name)?;
        if self.active.as_deref() == Some(name) {
            self.active = self.profiles.keys().next().cloned();
        }
        Some(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    pub fn active_profile(&self) -> Option<&Profile> {
        self.active.as_deref().and_then(|name| self.profiles.get(name))
    }

    pub fn entries(&self) -> Vec<ProfileEntry> {
        self.profiles
            .keys()
            .map(|name| ProfileEntry {
                name: name.clone(),
                active: self.active.as_deref() == Some(name.as_str()),
            })
            .collect()
    }
}
