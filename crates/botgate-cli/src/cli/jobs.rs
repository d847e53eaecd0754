//! Job queue inspection and settlement.

use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use botgate_core::service::identity::IdentityError;
use botgate_types::job::Job;

use crate::state::AppState;

pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let pending = state.jobs.pending().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!();
        println!("  {} No pending jobs.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Kind").fg(Color::White),
        Cell::new("Bot").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Queued").fg(Color::White),
    ]);

    for queued in &pending {
        let source = match &queued.job {
            Job::FetchAvatar { url, .. } => url.as_str(),
        };
        table.add_row(vec![
            Cell::new(queued.id.to_string()).fg(Color::DarkGrey),
            Cell::new(queued.job.kind().to_string()).fg(Color::Cyan),
            Cell::new(queued.job.bot_id().to_string()),
            Cell::new(source),
            Cell::new(queued.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} pending", style(pending.len()).bold());
    println!();
    Ok(())
}

pub async fn finish(state: &AppState, id: &Uuid, failed: bool, json: bool) -> Result<()> {
    let queued = state
        .jobs
        .get_pending(id)
        .await?
        .ok_or_else(|| anyhow!("job {id} is not pending"))?;

    // Record the outcome before settling, so a failure leaves the job pending.
    let mut thumbnail = None;
    if !failed {
        match &queued.job {
            Job::FetchAvatar { bot_id, .. } => {
                match state.identity.record_fetched_avatar(bot_id).await {
                    Ok(view) => thumbnail = view.thumbnail,
                    Err(IdentityError::NotFound) => anyhow::bail!(
                        "no fetched avatar for bot {bot_id}; finish the job with --failed instead"
                    ),
                    Err(e) => return Err(e.into()),
                }
            }
        }
    }

    if !state.jobs.finish(id, !failed).await? {
        anyhow::bail!("job {id} is not pending");
    }

    let status = if failed { "failed" } else { "done" };
    if json {
        let mut out = serde_json::json!({"id": id, "status": status});
        if let Some(thumbnail) = &thumbnail {
            out["thumbnail"] = serde_json::json!(thumbnail);
        }
        println!("{out}");
    } else {
        println!("  {} Job {} marked {}.", style("✓").green().bold(), id, status);
        if let Some(thumbnail) = &thumbnail {
            println!("  {} {}", style("Thumbnail:").bold(), thumbnail);
        }
    }
    Ok(())
}

pub async fn prune(state: &AppState, older_than_days: u32, json: bool) -> Result<()> {
    let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
    let removed = state.jobs.prune(cutoff).await?;
    tracing::debug!(removed, %cutoff, "pruned settled jobs");

    if json {
        println!("{}", serde_json::json!({"removed": removed}));
    } else {
        println!(
            "  {} Removed {} settled job(s) older than {} day(s).",
            style("✓").green().bold(),
            removed,
            older_than_days
        );
    }
    Ok(())
}
