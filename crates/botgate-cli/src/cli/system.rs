//! Global bot commands. These run with operator privileges and take no
//! tenant.

use anyhow::Result;
use console::style;

use botgate_types::bot::{BotId, CreateBotRequest};

use super::bot::{bots_table, confirm_delete, print_bot, print_token};
use crate::state::AppState;

pub async fn provision(
    state: &AppState,
    name: String,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let request = CreateBotRequest {
        name,
        description,
        outgoing_url: None,
    };
    let provisioned = state.identity.provision_global_bot(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&provisioned)?);
        return Ok(());
    }

    println!();
    println!("  {} Global bot provisioned.", style("✓").green().bold());
    print_bot(&provisioned.bot);
    if let Some(token) = &provisioned.credential.access_token {
        print_token(token.expose());
    }
    Ok(())
}

pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let bots = state.identity.list_global_bots().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bots)?);
        return Ok(());
    }

    if bots.is_empty() {
        println!();
        println!(
            "  {} No global bots. Provision one with: {}",
            style("i").blue().bold(),
            style("botgate system provision <name>").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", bots_table(&bots));
    println!();
    Ok(())
}

pub async fn rotate(state: &AppState, id: &BotId, json: bool) -> Result<()> {
    let credential = state.identity.rotate_global_credential(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&credential)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Token rotated at {}.",
        style("✓").green().bold(),
        credential.issued_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();
    if let Some(token) = &credential.access_token {
        print_token(token.expose());
    }
    Ok(())
}

pub async fn retire(state: &AppState, id: &BotId, force: bool, json: bool) -> Result<()> {
    if !force && !json && !confirm_delete(&id.to_string())? {
        println!("  Cancelled.");
        return Ok(());
    }

    state.identity.retire_global_bot(id).await?;

    if json {
        println!("{}", serde_json::json!({"retired": true, "id": id}));
    } else {
        println!("  {} Global bot {} retired.", style("✓").red().bold(), id);
    }
    Ok(())
}
