//! CLI routing and command dispatch.

use crate::core::env_probe::ProcessEnv;
use crate::core::file_store::FileStore;
use crate::core::keychain::Keychain;
use crate::core::login::{Flow, TerminalPrompter};
use crate::core::paths::ConfigPaths;
use crate::core::registry::ContextRegistry;
use crate::core::resolver::Resolver;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod auth;
pub mod context;

/// Shared context passed to all command handlers.
pub struct CliContext {
    pub store: FileStore,
    pub keychain: Keychain,
    pub env: ProcessEnv,
    pub prompter: TerminalPrompter,
    pub interactive: bool,
}

impl CliContext {
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.env, &self.keychain, &self.store)
    }

    pub fn contexts(&self) -> ContextRegistry<'_> {
        ContextRegistry::new(&self.env, &self.keychain, &self.store)
    }

    pub fn paths(&self) -> &ConfigPaths {
        self.store.paths()
    }
}

#[derive(Parser, Debug)]
#[command(name = "hetzner", version, about = "Command-line client for the Hetzner Robot and Cloud APIs")]
pub struct Cli {
    /// Config directory (default: ~/.hetzner-cli)
    #[arg(long, global = true, value_name = "PATH", env = "HETZNER_CLI_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Never use the system keychain; store secrets in the config directory
    #[arg(long, global = true, env = "HETZNER_CLI_NO_KEYCHAIN")]
    pub no_keychain: bool,

    /// Run in non-interactive mode (no prompts, suitable for automation)
    #[arg(long, global = true, env = "HETZNER_CLI_NON_INTERACTIVE")]
    pub non_interactive: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Run the selected command. `Flow::Cancelled` means the user aborted a
    /// prompt and the process should exit successfully without output.
    pub fn run(self) -> Result<Flow<()>> {
        let env = ProcessEnv;
        let paths = ConfigPaths::resolve(self.config_dir, &env)?;
        let keychain = if self.no_keychain {
            Keychain::disabled()
        } else {
            Keychain::system()
        };

        let ctx = CliContext {
            store: FileStore::new(paths),
            keychain,
            env,
            prompter: TerminalPrompter,
            interactive: !self.non_interactive && console::user_attended(),
        };

        match self.command {
            Commands::Login(args) => auth::run_login(&ctx, args),
            Commands::Logout => auth::run_logout(&ctx),
            Commands::Whoami(args) => auth::run_whoami(&ctx, args),
            Commands::Status(args) => auth::run_status(&ctx, args),
            Commands::Context { command } => context::run(&ctx, command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store Robot credentials (keychain when available, config file otherwise)
    Login(auth::LoginArgs),
    /// Remove stored Robot credentials from keychain and config file
    Logout,
    /// Show which Robot user commands will authenticate as
    Whoami(auth::WhoamiArgs),
    /// Show where each credential would be resolved from
    Status(auth::StatusArgs),
    /// Manage named Cloud contexts
    Context {
        #[command(subcommand)]
        command: context::ContextCommand,
    },
}

/// Error line printed to stderr; the marker is only coloured when stderr
/// itself supports colour.
pub fn error_line(err: &anyhow::Error) -> String {
    format!("{} {:#}", console::style("✗").for_stderr().red().bold(), err)
}
