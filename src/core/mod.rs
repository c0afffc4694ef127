//! Credential resolution and storage.

pub mod env_probe;
pub mod file_store;
pub mod identifier;
pub mod keychain;
pub mod login;
pub mod paths;
pub mod registry;
pub mod resolver;
