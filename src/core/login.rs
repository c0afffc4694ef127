//! Interactive Robot login and file-to-keychain migration.
//!
//! The flow is linear:
//! 1. offer to move credentials found in the config file into the keychain
//! 2. ask for user and password
//! 3. offer to save them (keychain when usable, file otherwise)
//!
//! Cancelling any prompt ends the flow with `Flow::Cancelled`.

use crate::core::file_store::Domain;
use crate::core::resolver::Resolver;
use crate::error::{CredentialError, Result};
use crate::models::credentials::{CredentialSet, CredentialSource, ResolvedCredentials};
use dialoguer::{Confirm, Input, Password};
use std::io;
use tracing::warn;

/// Answer to a single prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    Answered(T),
    Cancelled,
}

/// Outcome of an interactive flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow<T> {
    Done(T),
    /// The user aborted a prompt. Not a failure.
    Cancelled,
}

/// Source of interactive answers.
pub trait Prompter {
    fn confirm(&self, message: &str, default: bool) -> anyhow::Result<Prompt<bool>>;
    fn input(&self, message: &str) -> anyhow::Result<Prompt<String>>;
    fn password(&self, message: &str) -> anyhow::Result<Prompt<String>>;
}

/// Terminal prompts.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, message: &str, default: bool) -> anyhow::Result<Prompt<bool>> {
        match Confirm::new()
            .with_prompt(message)
            .default(default)
            .interact_opt()
        {
            Ok(Some(answer)) => Ok(Prompt::Answered(answer)),
            Ok(None) => Ok(Prompt::Cancelled),
            Err(e) => interrupted(e),
        }
    }

    fn input(&self, message: &str) -> anyhow::Result<Prompt<String>> {
        match Input::<String>::new().with_prompt(message).interact_text() {
            Ok(value) => Ok(Prompt::Answered(value)),
            Err(e) => interrupted(e),
        }
    }

    fn password(&self, message: &str) -> anyhow::Result<Prompt<String>> {
        match Password::new().with_prompt(message).interact() {
            Ok(value) => Ok(Prompt::Answered(value)),
            Err(e) => interrupted(e),
        }
    }
}

fn interrupted<T>(err: dialoguer::Error) -> anyhow::Result<Prompt<T>> {
    match err {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Prompt::Cancelled),
        other => Err(anyhow::Error::new(other).context("read from prompt")),
    }
}

/// Result of a completed login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub credentials: CredentialSet,
    /// Where the credentials were persisted, if anywhere.
    pub stored_in: Option<CredentialSource>,
    /// True when existing file credentials were moved into the keychain.
    pub migrated: bool,
}

macro_rules! answer {
    ($prompt:expr) => {
        match $prompt {
            Prompt::Answered(value) => value,
            Prompt::Cancelled => return Ok(Flow::Cancelled),
        }
    };
}

pub fn login(resolver: &Resolver<'_>, prompter: &dyn Prompter) -> Result<Flow<LoginOutcome>> {
    let keychain_ready = resolver.keychain().probe();

    if keychain_ready {
        if let Some(existing) = resolver.from_file()? {
            let question = format!(
                "Credentials for '{}' are stored in {}. Move them to the system keychain?",
                existing.user,
                resolver.store().path(Domain::Robot).display()
            );
            if answer!(prompter.confirm(&question, true)?) {
                if resolver.save_to_keychain(&existing) {
                    resolver.store().clear(Domain::Robot)?;
                    return Ok(Flow::Done(LoginOutcome {
                        credentials: existing,
                        stored_in: Some(CredentialSource::Keychain),
                        migrated: true,
                    }));
                }
                warn!("keychain write failed, credentials stay in the config file");
            }
        }
    }

    let user = answer!(required(|| prompter.input("Robot username"))?);
    let password = answer!(required(|| prompter.password("Robot password"))?);
    let credentials = CredentialSet::new(user, password);

    let question = if keychain_ready {
        "Save credentials to the system keychain?".to_string()
    } else {
        format!(
            "Save credentials to {}?",
            resolver.store().path(Domain::Robot).display()
        )
    };
    let stored_in = if !answer!(prompter.confirm(&question, true)?) {
        None
    } else if keychain_ready {
        Some(resolver.save(&credentials)?)
    } else {
        // Only the file was offered.
        resolver.save_to_file(&credentials)?;
        Some(CredentialSource::File)
    };

    Ok(Flow::Done(LoginOutcome {
        credentials,
        stored_in,
        migrated: false,
    }))
}

fn required<F>(mut ask: F) -> anyhow::Result<Prompt<String>>
where
    F: FnMut() -> anyhow::Result<Prompt<String>>,
{
    loop {
        match ask()? {
            Prompt::Answered(value) if value.trim().is_empty() => continue,
            other => return Ok(other),
        }
    }
}

/// Resolve Robot credentials, falling back to the login flow when
/// `interactive` is set and nothing is stored.
pub fn ensure_credentials(
    resolver: &Resolver<'_>,
    prompter: &dyn Prompter,
    explicit: Option<CredentialSet>,
    interactive: bool,
) -> Result<Flow<ResolvedCredentials>> {
    match resolver.resolve(explicit) {
        Ok(resolved) => Ok(Flow::Done(resolved)),
        Err(CredentialError::NoCredentialsFound(_)) if interactive => {
            Ok(match login(resolver, prompter)? {
                Flow::Done(outcome) => Flow::Done(ResolvedCredentials {
                    credentials: outcome.credentials,
                    source: outcome.stored_in.unwrap_or(CredentialSource::Explicit),
                }),
                Flow::Cancelled => Flow::Cancelled,
            })
        }
        Err(e) => Err(e),
    }
}
