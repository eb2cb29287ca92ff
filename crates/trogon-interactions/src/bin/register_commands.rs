//! Registers the built-in slash commands with Discord.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use trogon_interactions::Catalog;
use trogon_interactions::commands::default_registry;
use trogon_interactions::config::RegisterConfig;
use trogon_interactions::env::SystemEnv;
use trogon_interactions::register::CommandRegistrar;

#[derive(Parser, Debug)]
#[command(
    name = "register-commands",
    about = "Overwrite the application's slash commands"
)]
struct Args {
    /// Register in one guild instead of globally
    #[arg(long, env = "DISCORD_GUILD_ID")]
    guild_id: Option<String>,

    /// Print the command definitions instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let registry = default_registry(Arc::new(Catalog::pokemon()), Arc::new(Catalog::samples()))
        .context("Failed to build command registry")?;
    let definitions = registry.definitions();

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&definitions)?);
        return Ok(());
    }

    let mut config = RegisterConfig::from_env(&SystemEnv).context("Invalid configuration")?;
    if args.guild_id.is_some() {
        config.guild_id = args.guild_id;
    }

    let registrar = CommandRegistrar::new(config);
    let registered = registrar
        .overwrite(&definitions)
        .await
        .context("Failed to register commands")?;

    for command in registered {
        println!("/{} ({})", command.name, command.id);
    }
    Ok(())
}
