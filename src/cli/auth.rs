//! Robot login, logout and credential status.

use crate::cli::CliContext;
use crate::constants;
use crate::core::env_probe;
use crate::core::file_store::Domain;
use crate::core::login::{self, Flow};
use crate::error::CredentialError;
use crate::models::credentials::{CredentialSet, CredentialSource};
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use serde::Serialize;
use std::io::Read;
use zeroize::Zeroizing;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Robot user name (skips the interactive prompts)
    #[arg(long, requires = "password_stdin")]
    pub user: Option<String>,

    /// Read the Robot password from stdin
    #[arg(long, requires = "user")]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Robot user name, overriding stored credentials
    #[arg(long, requires = "password")]
    pub user: Option<String>,

    /// Robot password, overriding stored credentials
    #[arg(long, requires = "user")]
    pub password: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Serialize)]
struct StatusReport {
    config_dir: String,
    keychain_available: bool,
    robot: DomainStatus,
    cloud: DomainStatus,
}

#[derive(Serialize)]
struct DomainStatus {
    source: CredentialSource,
    detail: Option<String>,
}

pub fn run_login(ctx: &CliContext, args: LoginArgs) -> Result<Flow<()>> {
    let resolver = ctx.resolver();

    if let Some(user) = args.user {
        let password = read_stdin_secret().context("read password from stdin")?;
        let creds = CredentialSet::new(user, password.as_str());
        let stored_in = resolver.save(&creds)?;
        print_stored(ctx, &creds.user, stored_in);
        return Ok(Flow::Done(()));
    }

    if !ctx.interactive {
        bail!("--non-interactive requires --user and --password-stdin for login");
    }

    let outcome = match login::login(&resolver, &ctx.prompter)? {
        Flow::Done(outcome) => outcome,
        Flow::Cancelled => return Ok(Flow::Cancelled),
    };

    if outcome.migrated {
        println!(
            "Moved credentials for '{}' from {} to the system keychain",
            outcome.credentials.user,
            ctx.store.path(Domain::Robot).display()
        );
    } else if let Some(stored_in) = outcome.stored_in {
        print_stored(ctx, &outcome.credentials.user, stored_in);
    } else {
        println!("Credentials not saved");
    }
    Ok(Flow::Done(()))
}

fn print_stored(ctx: &CliContext, user: &str, stored_in: CredentialSource) {
    match stored_in {
        CredentialSource::Keychain => {
            println!("Saved credentials for '{}' to the system keychain", user)
        }
        _ => println!(
            "Saved credentials for '{}' to {}",
            user,
            ctx.store.path(Domain::Robot).display()
        ),
    }
}

pub fn run_logout(ctx: &CliContext) -> Result<Flow<()>> {
    ctx.resolver().clear()?;
    println!("Removed stored Robot credentials");
    if env_probe::robot_from_env(&ctx.env).is_some() {
        println!(
            "note: {} and {} are still set in the environment",
            constants::ENV_ROBOT_USER,
            constants::ENV_ROBOT_PASSWORD
        );
    }
    Ok(Flow::Done(()))
}

pub fn run_whoami(ctx: &CliContext, args: WhoamiArgs) -> Result<Flow<()>> {
    let explicit = match (args.user, args.password) {
        (Some(user), Some(password)) => Some(CredentialSet::new(user, password)),
        _ => None,
    };
    let resolver = ctx.resolver();
    match login::ensure_credentials(&resolver, &ctx.prompter, explicit, ctx.interactive)? {
        Flow::Done(resolved) => {
            println!("{} (from {})", resolved.credentials.user, resolved.source);
            Ok(Flow::Done(()))
        }
        Flow::Cancelled => Ok(Flow::Cancelled),
    }
}

pub fn run_status(ctx: &CliContext, args: StatusArgs) -> Result<Flow<()>> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let robot = match ctx.resolver().query(None)? {
        Some(resolved) => DomainStatus {
            source: resolved.source,
            detail: Some(format!("user {}", resolved.credentials.user)),
        },
        None => DomainStatus {
            source: CredentialSource::None,
            detail: None,
        },
    };
    let cloud = match ctx.contexts().resolve_token(None) {
        Ok(token) => DomainStatus {
            source: token.source,
            detail: token.context.map(|name| format!("context {}", name)),
        },
        Err(CredentialError::NoCredentialsFound(_)) => DomainStatus {
            source: CredentialSource::None,
            detail: ctx.contexts().active()?.map(|name| format!("context {} (no token)", name)),
        },
        Err(e) => return Err(e.into()),
    };

    let report = StatusReport {
        config_dir: ctx.paths().to_string(),
        keychain_available: ctx.keychain.probe(),
        robot,
        cloud,
    };

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&report).context("serialize status")?;
        println!("{}", json);
        return Ok(Flow::Done(()));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Credential").add_attribute(Attribute::Bold),
        Cell::new("Source").add_attribute(Attribute::Bold),
        Cell::new("Detail").add_attribute(Attribute::Bold),
    ]);
    for (label, status) in [("Robot", &report.robot), ("Cloud", &report.cloud)] {
        let source = match status.source {
            CredentialSource::None => Cell::new("none").fg(Color::Red),
            other => Cell::new(other.to_string()).fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(label),
            source,
            Cell::new(status.detail.clone().unwrap_or_else(|| "-".to_string())),
        ]);
    }
    println!("{}", table);
    println!("Config directory: {}", report.config_dir);
    println!(
        "System keychain: {}",
        if report.keychain_available { "available" } else { "unavailable" }
    );
    Ok(Flow::Done(()))
}

/// Read a secret from stdin, dropping trailing newlines.
pub(crate) fn read_stdin_secret() -> Result<Zeroizing<String>> {
    let mut buf = Zeroizing::new(String::new());
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read secret from stdin")?;
    let secret = Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string());
    if secret.is_empty() {
        bail!("secret from stdin is empty");
    }
    if secret.len() > constants::MAX_SECRET_SIZE {
        bail!(
            "secret exceeds maximum size ({} bytes, max {} bytes)",
            secret.len(),
            constants::MAX_SECRET_SIZE
        );
    }
    Ok(secret)
}
