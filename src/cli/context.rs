use crate::cli::auth::read_stdin_secret;
use crate::cli::CliContext;
use crate::constants;
use crate::core::login::{Flow, Prompt, Prompter};
use crate::models::credentials::CredentialSource;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};
use zeroize::Zeroizing;

fn parse_context_name(s: &str) -> Result<String, String> {
    if s.is_empty() {
        return Err("name cannot be empty".into());
    }
    if s.chars().any(char::is_control) {
        return Err("control characters not allowed".into());
    }
    Ok(s.to_string())
}

#[derive(Subcommand, Debug)]
pub enum ContextCommand {
    /// Create a context, or replace the token of an existing one
    Create(CreateArgs),
    /// Make a context the active one
    Use(NameArgs),
    /// Delete a context and its stored token
    Delete(NameArgs),
    /// List contexts
    List(ListArgs),
    /// Print the active context name
    Active,
    /// Move tokens stored in the config file into the system keychain
    Migrate,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Context name
    #[arg(value_parser = parse_context_name)]
    pub name: String,

    /// Read the API token from stdin instead of interactive prompt
    #[arg(long)]
    pub token_stdin: bool,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Context name
    #[arg(value_parser = parse_context_name)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

pub fn run(ctx: &CliContext, cmd: ContextCommand) -> Result<Flow<()>> {
    match cmd {
        ContextCommand::Create(args) => run_create(ctx, args),
        ContextCommand::Use(args) => run_use(ctx, args),
        ContextCommand::Delete(args) => run_delete(ctx, args),
        ContextCommand::List(args) => run_list(ctx, args),
        ContextCommand::Active => run_active(ctx),
        ContextCommand::Migrate => run_migrate(ctx),
    }
}

fn run_create(ctx: &CliContext, args: CreateArgs) -> Result<Flow<()>> {
    // Non-interactive mode requires --token-stdin
    if !ctx.interactive && !args.token_stdin {
        bail!("--non-interactive requires --token-stdin for context create");
    }

    let token = if args.token_stdin {
        read_stdin_secret()?
    } else {
        match read_token_prompt(&ctx.prompter, &args.name)? {
            Prompt::Answered(token) => token,
            Prompt::Cancelled => return Ok(Flow::Cancelled),
        }
    };

    let contexts = ctx.contexts();
    let stored_in = contexts.create(&args.name, &token)?;
    match stored_in {
        CredentialSource::Keychain => {
            println!("Context '{}' created (token in system keychain)", args.name)
        }
        _ => println!(
            "Context '{}' created (token in {}; system keychain unavailable)",
            args.name,
            ctx.paths().cloud_file.display()
        ),
    }
    if contexts.active()?.as_deref() == Some(args.name.as_str()) {
        println!("Active context: {}", args.name);
    }
    Ok(Flow::Done(()))
}

fn read_token_prompt(prompter: &dyn Prompter, name: &str) -> Result<Prompt<Zeroizing<String>>> {
    loop {
        match prompter.password(&format!("API token for {}", name))? {
            Prompt::Answered(token) if token.is_empty() => continue,
            Prompt::Answered(token) => {
                if token.len() > constants::MAX_SECRET_SIZE {
                    bail!(
                        "token exceeds maximum size ({} bytes, max {} bytes)",
                        token.len(),
                        constants::MAX_SECRET_SIZE
                    );
                }
                return Ok(Prompt::Answered(Zeroizing::new(token)));
            }
            Prompt::Cancelled => return Ok(Prompt::Cancelled),
        }
    }
}

fn run_use(ctx: &CliContext, args: NameArgs) -> Result<Flow<()>> {
    ctx.contexts().use_context(&args.name)?;
    println!("Active context: {}", args.name);
    Ok(Flow::Done(()))
}

fn run_delete(ctx: &CliContext, args: NameArgs) -> Result<Flow<()>> {
    let contexts = ctx.contexts();
    contexts.delete(&args.name)?;
    println!("Deleted context '{}'", args.name);
    match contexts.active()? {
        Some(active) => println!("Active context: {}", active),
        None => println!("No active context"),
    }
    Ok(Flow::Done(()))
}

fn run_list(ctx: &CliContext, args: ListArgs) -> Result<Flow<()>> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let entries = ctx.contexts().list()?;

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&entries).context("serialize list")?;
        println!("{}", json);
        return Ok(Flow::Done(()));
    }

    if entries.is_empty() {
        println!("No contexts found");
        return Ok(Flow::Done(()));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Active").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
    ]);
    for entry in entries {
        let marker = if entry.active {
            Cell::new("*").fg(Color::Green)
        } else {
            Cell::new("")
        };
        table.add_row(vec![marker, Cell::new(entry.name)]);
    }
    println!("{}", table);
    Ok(Flow::Done(()))
}

fn run_active(ctx: &CliContext) -> Result<Flow<()>> {
    match ctx.contexts().active()? {
        Some(name) => println!("{}", name),
        None => bail!("no active context (run 'hetzner context create <name>')"),
    }
    Ok(Flow::Done(()))
}

fn run_migrate(ctx: &CliContext) -> Result<Flow<()>> {
    if !ctx.keychain.probe() {
        bail!("system keychain unavailable; tokens stay in {}", ctx.paths().cloud_file.display());
    }
    let migrated = ctx.contexts().migrate_to_keychain()?;
    if migrated.is_empty() {
        println!("Nothing to migrate");
    } else {
        for name in &migrated {
            println!("  Migrated: {}", name);
        }
        println!("\nMoved {} token(s) to the system keychain", migrated.len());
    }
    Ok(Flow::Done(()))
}
