//! Config directory resolution and file layout.

use crate::constants;
use crate::core::env_probe::EnvSource;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub root: PathBuf,
    pub robot_file: PathBuf,
    pub cloud_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve the config directory from CLI arg, env var, or the home directory.
    pub fn resolve(root_arg: Option<PathBuf>, env: &dyn EnvSource) -> Result<Self> {
        if let Some(root) = root_arg {
            return Ok(Self::from_root(root));
        }
        if let Some(root) = env.var(constants::ENV_CONFIG_DIR) {
            return Ok(Self::from_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().context("resolve home directory")?;
        Ok(Self::from_root(home.join(constants::CONFIG_DIR_NAME)))
    }

    /// Create config paths from a root directory.
    pub fn from_root(root: PathBuf) -> Self {
        let robot_file = root.join(constants::ROBOT_FILE_NAME);
        let cloud_file = root.join(constants::CLOUD_FILE_NAME);
        Self {
            root,
            robot_file,
            cloud_file,
        }
    }
}

impl std::fmt::Display for ConfigPaths {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_root() {
        let paths = ConfigPaths::from_root(PathBuf::from("/test"));
        assert_eq!(paths.root, PathBuf::from("/test"));
        assert_eq!(paths.robot_file, PathBuf::from("/test/credentials.json"));
        assert_eq!(paths.cloud_file, PathBuf::from("/test/contexts.json"));
    }

    #[test]
    fn test_resolve_prefers_arg_over_env() {
        let env: HashMap<String, String> =
            [(constants::ENV_CONFIG_DIR.to_string(), "/from-env".to_string())].into();
        let paths = ConfigPaths::resolve(Some(PathBuf::from("/from-arg")), &env).unwrap();
        assert_eq!(paths.root, PathBuf::from("/from-arg"));

        let paths = ConfigPaths::resolve(None, &env).unwrap();
        assert_eq!(paths.root, PathBuf::from("/from-env"));
    }
}
