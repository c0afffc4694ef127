//! Credential and context resolution for the Hetzner command-line client.
//!
//! Decides which secret each invocation authenticates with, where it may come
//! from, and how it degrades when the system keychain is unavailable.
//!
//! ## Modules
//! - `cli`: Command-line handlers
//! - `core`: Resolution logic (env, keychain, file store, contexts, login)
//! - `models`: Data structures
//! - `util`: Filesystem and logging helpers

pub mod cli;
pub mod constants;
pub mod core;
pub mod error;
pub mod models;
pub mod util;

pub use error::{CredentialError, Result};
