//! botgate CLI entry point.
//!
//! Binary name: `botgate`
//!
//! Parses CLI arguments, initializes tracing, the database and the identity
//! service, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use botgate_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use botgate_types::credential::Redacted;
use cli::{BotCommand, Cli, Commands, JobsCommand, SystemCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions {
        json: cli.log_json,
        otel: cli.otel,
        ..TracingOptions::from_verbosity(cli.verbose, cli.quiet)
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "botgate", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let result = run(&state, cli).await;

    shutdown_tracing();
    result
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Bot { caller, action } => match action {
            BotCommand::List => cli::bot::list_bots(state, &caller, json).await?,
            BotCommand::Show { id } => cli::bot::show_bot(state, &caller, &id, json).await?,
            BotCommand::Create {
                name,
                description,
                outgoing_url,
            } => {
                cli::bot::create_bot(state, &caller, name, description, outgoing_url, json).await?;
            }
            BotCommand::Update {
                id,
                name,
                description,
                outgoing_url,
                avatar_file,
                avatar_url,
            } => {
                cli::bot::update_bot(
                    state,
                    &caller,
                    &id,
                    name,
                    description,
                    outgoing_url,
                    avatar_file,
                    avatar_url,
                    json,
                )
                .await?;
            }
            BotCommand::Delete { id, force } => {
                cli::bot::delete_bot(state, &caller, &id, force, json).await?;
            }
            BotCommand::RemoveAvatar { id } => {
                cli::bot::remove_avatar(state, &caller, &id, json).await?;
            }
            BotCommand::ResetToken { id } => {
                cli::bot::reset_token(state, &caller, &id, json).await?;
            }
        },

        Commands::System { action } => match action {
            SystemCommand::Provision { name, description } => {
                cli::system::provision(state, name, description, json).await?;
            }
            SystemCommand::List => cli::system::list(state, json).await?,
            SystemCommand::Rotate { id } => cli::system::rotate(state, &id, json).await?,
            SystemCommand::Retire { id, force } => {
                cli::system::retire(state, &id, force, json).await?;
            }
        },

        Commands::VerifyToken { token } => {
            let token = Redacted::new(token);
            let bot = state.identity.authenticate_bot(token.expose()).await?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": true,
                        "token": token.masked(),
                        "bot_id": bot.id,
                        "name": bot.name,
                        "system_bot": bot.is_global(),
                    })
                );
            } else {
                println!(
                    "  {} Token {} belongs to {} ({})",
                    console::style("✓").green().bold(),
                    console::style(token.masked()).dim(),
                    console::style(&bot.name).cyan().bold(),
                    bot.id
                );
            }
        }

        Commands::Jobs { action } => match action {
            JobsCommand::List => cli::jobs::list(state, json).await?,
            JobsCommand::Finish { id, failed } => {
                cli::jobs::finish(state, &id, failed, json).await?;
            }
            JobsCommand::Prune { older_than_days } => {
                cli::jobs::prune(state, older_than_days, json).await?;
            }
        },

        Commands::Status => cli::status::status(state, json).await?,

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
