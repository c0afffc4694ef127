//! Credentials supplied through environment variables.

use crate::constants;
use crate::models::credentials::CredentialSet;
use std::collections::HashMap;

/// Read access to a process environment.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

fn non_empty(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key).filter(|v| !v.is_empty())
}

/// Robot credentials from `HETZNER_ROBOT_USER` / `HETZNER_ROBOT_PASSWORD`.
///
/// A partial pair counts as absent.
pub fn robot_from_env(env: &dyn EnvSource) -> Option<CredentialSet> {
    let user = non_empty(env, constants::ENV_ROBOT_USER)?;
    let password = non_empty(env, constants::ENV_ROBOT_PASSWORD)?;
    Some(CredentialSet::new(user, password))
}

/// Cloud token from `HETZNER_CLOUD_TOKEN`.
pub fn cloud_token_from_env(env: &dyn EnvSource) -> Option<String> {
    non_empty(env, constants::ENV_CLOUD_TOKEN)
}
