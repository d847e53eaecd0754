//! Status command: where botgate keeps its state and how it is configured.

use anyhow::Result;
use console::style;

use botgate_infra::config::resolve_database_url;
use botgate_types::config::KeySource;

use crate::state::AppState;

/// Display data directory, database, key source and queue depth.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let database_url = resolve_database_url(&state.config, &state.data_dir);
    let global_bots = state.identity.list_global_bots().await?;
    let pending_jobs = state.jobs.pending().await?.len();
    let key_source = match state.config.credentials.key_source {
        KeySource::File => "file",
        KeySource::Keychain => "keychain",
    };

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "database_url": database_url,
            "key_source": key_source,
            "token_prefix": state.config.credentials.token_prefix,
            "avatar_max_bytes": state.config.avatars.max_bytes,
            "global_bots": global_bots.len(),
            "pending_jobs": pending_jobs,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} botgate v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Storage ──").dim());
    println!("  Data dir:     {}", style(state.data_dir.display()).dim());
    println!("  Database:     {}", style(&database_url).dim());
    println!();

    println!("  {}", style("── Credentials ──").dim());
    println!("  Key source:   {}", style(key_source).bold());
    println!("  Token prefix: {}", state.config.credentials.token_prefix);
    println!();

    println!("  {}", style("── Activity ──").dim());
    println!("  Global bots:  {}", style(global_bots.len()).bold());
    if pending_jobs > 0 {
        println!("  Pending jobs: {}", style(pending_jobs).yellow());
    } else {
        println!("  Pending jobs: {}", style(pending_jobs).green());
    }
    println!();

    Ok(())
}
