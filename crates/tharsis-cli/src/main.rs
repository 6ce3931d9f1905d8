mod auth;
mod cli;
mod commands;
mod config;
mod logging;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tharsis_client::{DEFAULT_TIMEOUT, HttpClient};

use cli::{Cli, Commands, IdentityCommands, OutputFormat, PayloadCommands, RuleCommands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    let profile = &cli.profile;
    let format = resolve_format(cli.format, profile)?;

    match &cli.command {
        Commands::Login(args) => {
            let server = config::resolve_server(&cli.server, profile)?;
            commands::auth::login(&server, args, profile)?;
        }
        Commands::Logout => {
            commands::auth::logout(profile)?;
        }
        Commands::Whoami => {
            commands::auth::whoami(profile)?;
        }
        Commands::Config(args) => match &args.command {
            cli::ConfigCommands::Show => {
                let cfg = config::load_profile(profile)?;
                println!("{}: {}", "Profile".cyan(), profile);
                println!(
                    "{}: {}",
                    "Server".cyan(),
                    cfg.server.as_deref().unwrap_or("(not set)")
                );
                println!(
                    "{}: {}",
                    "Format".cyan(),
                    cfg.format.as_deref().unwrap_or("json")
                );
                println!(
                    "{}: {}s",
                    "Timeout".cyan(),
                    cfg.timeout().unwrap_or(DEFAULT_TIMEOUT).as_secs()
                );
            }
            cli::ConfigCommands::Set(set_args) => {
                let mut cfg = config::load_profile(profile)?;
                cfg.set(&set_args.key, &set_args.value)?;
                config::save_profile(profile, &cfg)?;
                output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
            }
        },
        Commands::Payload(args) => match &args.command {
            PayloadCommands::Encode(encode) => commands::payload::encode(encode)?,
            PayloadCommands::Decode(decode) => commands::payload::decode(&decode.payload)?,
        },
        Commands::Identity(args) => {
            let client = make_client(&cli.server, profile)?;
            match &args.command {
                IdentityCommands::Get(a) => commands::identity::get(&client, &a.id, format).await?,
                IdentityCommands::Create(a) => {
                    commands::identity::create(&client, &a.file, format).await?
                }
                IdentityCommands::Update(a) => {
                    commands::identity::update(&client, &a.id, &a.file, format).await?
                }
                IdentityCommands::Delete(a) => commands::identity::delete(&client, &a.id).await?,
            }
        }
        Commands::Rule(args) => {
            let client = make_client(&cli.server, profile)?;
            match &args.command {
                RuleCommands::Get(a) => commands::rule::get(&client, &a.id, format).await?,
                RuleCommands::Create(a) => {
                    commands::rule::create(&client, &a.identity, &a.file, format).await?
                }
                RuleCommands::Update(a) => {
                    commands::rule::update(&client, &a.identity, &a.id, &a.file, format).await?
                }
                RuleCommands::Delete(a) => commands::rule::delete(&client, &a.id).await?,
            }
        }
        Commands::Apply(args) => {
            let client = make_client(&cli.server, profile)?;
            commands::apply::apply(&client, args, format).await?;
        }
        Commands::Destroy(args) => {
            let client = make_client(&cli.server, profile)?;
            commands::apply::destroy(&client, args).await?;
        }
    }

    Ok(())
}

fn resolve_format(flag: Option<OutputFormat>, profile: &str) -> Result<OutputFormat> {
    if let Some(format) = flag {
        return Ok(format);
    }
    Ok(match config::load_profile(profile)?.format.as_deref() {
        Some("table") => OutputFormat::Table,
        _ => OutputFormat::default(),
    })
}

fn make_client(cli_server: &Option<String>, profile: &str) -> Result<HttpClient> {
    let server = config::resolve_server(cli_server, profile)?;
    let timeout = config::load_profile(profile)?
        .timeout()
        .unwrap_or(DEFAULT_TIMEOUT);
    let token = auth::load_credentials(profile)?.map(|c| c.token);
    Ok(HttpClient::with_timeout(&server, token, timeout)?)
}
