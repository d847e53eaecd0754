//! Tenant bot commands: list, show, create, update, delete, remove-avatar,
//! reset-token.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use botgate_types::bot::{BotId, CreateBotRequest, UpdateBotRequest};
use botgate_types::view::BotView;

use super::CallerArgs;
use crate::state::AppState;

/// List bots visible to the tenant in a table.
pub async fn list_bots(state: &AppState, caller: &CallerArgs, json: bool) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;
    let bots = state.identity.list_bots(&actor, &tenant).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bots)?);
        return Ok(());
    }

    if bots.is_empty() {
        println!();
        println!(
            "  {} No bots found. Create one with: {}",
            style("i").blue().bold(),
            style("botgate bot create <name>").yellow()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("{}", bots_table(&bots));
    println!();
    println!(
        "  {} bot{}",
        style(bots.len()).bold(),
        if bots.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show one bot. Tokens are never part of this output.
pub async fn show_bot(state: &AppState, caller: &CallerArgs, id: &BotId, json: bool) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;
    let bot = state.identity.get_bot(&actor, &tenant, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    print_bot(&bot);
    Ok(())
}

pub async fn create_bot(
    state: &AppState,
    caller: &CallerArgs,
    name: String,
    description: Option<String>,
    outgoing_url: Option<String>,
    json: bool,
) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;
    let request = CreateBotRequest {
        name,
        description,
        outgoing_url,
    };
    let bot = state.identity.create_bot(&actor, &tenant, request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    println!();
    println!("  {} Bot created successfully!", style("✓").green().bold());
    print_bot(&bot);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn update_bot(
    state: &AppState,
    caller: &CallerArgs,
    id: &BotId,
    name: Option<String>,
    description: Option<String>,
    outgoing_url: Option<String>,
    avatar_file: Option<PathBuf>,
    avatar_url: Option<String>,
    json: bool,
) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;

    let avatar_bytes = match avatar_file {
        Some(path) => Some(tokio::fs::read(&path).await.map_err(|e| {
            anyhow::anyhow!("failed to read avatar file {}: {e}", path.display())
        })?),
        None => None,
    };
    let deferred = avatar_url.is_some();

    let patch = UpdateBotRequest {
        name,
        description,
        outgoing_url,
        avatar_bytes,
        avatar_url,
    };
    let bot = state.identity.update_bot(&actor, &tenant, id, patch).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    println!();
    println!("  {} Bot updated.", style("✓").green().bold());
    if deferred {
        println!(
            "  {} Avatar will be fetched in the background.",
            style("i").blue().bold()
        );
    }
    print_bot(&bot);
    Ok(())
}

/// Delete a bot permanently, asking first unless `force`.
pub async fn delete_bot(
    state: &AppState,
    caller: &CallerArgs,
    id: &BotId,
    force: bool,
    json: bool,
) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;

    if !force && !json {
        let bot = state.identity.get_bot(&actor, &tenant, id).await?;
        if !confirm_delete(&bot.name)? {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.identity.delete_bot(&actor, &tenant, id).await?;

    if json {
        println!("{}", serde_json::json!({"deleted": true, "id": id}));
    } else {
        println!("  {} Bot {} deleted.", style("✓").red().bold(), id);
    }
    Ok(())
}

pub async fn remove_avatar(
    state: &AppState,
    caller: &CallerArgs,
    id: &BotId,
    json: bool,
) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;
    state.identity.remove_avatar(&actor, &tenant, id).await?;

    if json {
        println!("{}", serde_json::json!({"avatar_removed": true, "id": id}));
    } else {
        println!("  {} Avatar removed.", style("✓").green().bold());
    }
    Ok(())
}

/// Rotate the bot's token and print the new one.
pub async fn reset_token(
    state: &AppState,
    caller: &CallerArgs,
    id: &BotId,
    json: bool,
) -> Result<()> {
    let (actor, tenant) = caller.resolve()?;
    let bot = state.identity.reset_credential(&actor, &tenant, id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Token rotated. The previous token no longer works.",
        style("✓").green().bold()
    );
    print_bot(&bot);
    Ok(())
}

pub(crate) fn confirm_delete(name: &str) -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!(
            "Permanently delete bot '{}' and its credential?",
            style(name).red().bold()
        ))
        .default(false)
        .interact()?)
}

pub(crate) fn bots_table(bots: &[BotView]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Avatar").fg(Color::White),
    ]);

    for bot in bots {
        let kind = if bot.system_bot {
            Cell::new("◆ system").fg(Color::Magenta)
        } else {
            Cell::new("● tenant").fg(Color::Green)
        };

        table.add_row(vec![
            Cell::new(&bot.name).fg(Color::Cyan),
            Cell::new(bot.id.to_string()).fg(Color::DarkGrey),
            kind,
            Cell::new(truncate(bot.description.as_deref().unwrap_or(""), 50)),
            Cell::new(if bot.thumbnail.is_some() { "yes" } else { "-" }),
        ]);
    }

    table
}

/// Styled detail view. The token line appears only when the view carries one.
pub(crate) fn print_bot(bot: &BotView) {
    println!();
    println!("  {}", style(&bot.name).cyan().bold());
    if let Some(description) = &bot.description {
        println!("  {}", style(description).dim());
    }
    println!();

    println!("  {}", style("── Details ──").dim());
    println!("  {}         {}", style("ID:").bold(), style(bot.id.to_string()).dim());
    println!(
        "  {}       {}",
        style("Kind:").bold(),
        if bot.system_bot { "system" } else { "tenant" }
    );
    println!(
        "  {}     {}",
        style("Avatar:").bold(),
        bot.thumbnail.as_deref().unwrap_or("(none)")
    );
    if let Some(outgoing_url) = &bot.outgoing_url {
        println!(
            "  {}   {}",
            style("Outgoing:").bold(),
            outgoing_url.as_deref().unwrap_or("(none)")
        );
    }
    println!();

    if let Some(token) = &bot.access_token {
        print_token(token.expose());
    }
}

pub(crate) fn print_token(token: &str) {
    println!("  {}", style("── Access Token ──").dim());
    println!("  {}", style(token).yellow().bold());
    println!(
        "  {}",
        style("Store it now. It is only shown on create, update and reset.").dim()
    );
    println!();
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 50), "short");
        assert_eq!(truncate("ééééééééé", 6), "ééé...");
    }

    #[test]
    fn test_bots_table_lists_every_bot() {
        let bots = vec![
            BotView {
                id: BotId::new(),
                name: "Helper".to_string(),
                description: Some("Answers questions".to_string()),
                system_bot: false,
                thumbnail: None,
                outgoing_url: Some(None),
                access_token: None,
            },
            BotView {
                id: BotId::new(),
                name: "Announcer".to_string(),
                description: None,
                system_bot: true,
                thumbnail: Some("avatars/x/thumbnail".to_string()),
                outgoing_url: None,
                access_token: None,
            },
        ];

        let rendered = bots_table(&bots).to_string();
        assert!(rendered.contains("Helper"));
        assert!(rendered.contains("Announcer"));
        assert!(rendered.contains("system"));
    }
}
