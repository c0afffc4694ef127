//! Centralized constants for environment names, paths, permissions and keychain keys.

/// Robot API user name.
pub const ENV_ROBOT_USER: &str = "HETZNER_ROBOT_USER";

/// Robot API password.
pub const ENV_ROBOT_PASSWORD: &str = "HETZNER_ROBOT_PASSWORD";

/// Cloud API token, independent of any context.
pub const ENV_CLOUD_TOKEN: &str = "HETZNER_CLOUD_TOKEN";

/// Overrides the per-user config directory.
pub const ENV_CONFIG_DIR: &str = "HETZNER_CLI_CONFIG_DIR";

/// Config directory name under the user's home directory.
pub const CONFIG_DIR_NAME: &str = ".hetzner-cli";

/// Robot credential document.
pub const ROBOT_FILE_NAME: &str = "credentials.json";

/// Cloud context registry document.
pub const CLOUD_FILE_NAME: &str = "contexts.json";

/// Permission mode for the config directory.
pub const CONFIG_DIR_MODE: u32 = 0o700;

/// Permission mode for credential documents.
pub const CONFIG_FILE_MODE: u32 = 0o600;

/// Keychain service identifier shared by both domains.
pub const KEYCHAIN_SERVICE: &str = "hetzner-cli";

/// Keychain account holding the Robot credential set as JSON.
pub const ROBOT_ACCOUNT: &str = "robot-credentials";

/// Prefix for per-context keychain accounts.
pub const CONTEXT_ACCOUNT_PREFIX: &str = "context:";

/// Account read by `Keychain::probe`. Never written.
pub const PROBE_ACCOUNT: &str = "__probe__";

/// Maximum accepted token size in bytes.
pub const MAX_SECRET_SIZE: usize = 65_536;

/// Keychain account for a named Cloud context.
pub fn context_account(name: &str) -> String {
    format!("{}{}", CONTEXT_ACCOUNT_PREFIX, name)
}
