//! CLI command definitions for the `botgate` binary.
//!
//! Tenant-scoped commands live under `bot` and act on behalf of a caller
//! given by `--tenant` and `--role`. `system` covers global bots, which have
//! no tenant scope.

pub mod bot;
pub mod jobs;
pub mod status;
pub mod system;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use botgate_types::actor::{Actor, ActorRole};
use botgate_types::bot::{BotId, TenantId};

/// Manage bot identities and their credentials.
#[derive(Parser)]
#[command(name = "botgate", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tenant-scoped bot management.
    Bot {
        #[command(flatten)]
        caller: CallerArgs,

        #[command(subcommand)]
        action: BotCommand,
    },

    /// Global (system) bots: provision, list, rotate, retire.
    System {
        #[command(subcommand)]
        action: SystemCommand,
    },

    /// Resolve a bot access token to the bot it belongs to.
    #[command(name = "verify-token")]
    VerifyToken {
        /// Token to check. Read from BOTGATE_TOKEN when omitted.
        #[arg(env = "BOTGATE_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Inspect the avatar fetch queue.
    Jobs {
        #[command(subcommand)]
        action: JobsCommand,
    },

    /// Show data directory, database and key configuration.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Who is making a tenant-scoped request.
#[derive(Args, Debug, Clone)]
pub struct CallerArgs {
    /// Tenant the request is made in.
    #[arg(long, global = true, env = "BOTGATE_TENANT")]
    pub tenant: Option<TenantId>,

    /// Caller role: administrator (admin), agent, or unauthenticated (anonymous).
    #[arg(long, global = true, default_value = "admin")]
    pub role: ActorRole,
}

impl CallerArgs {
    /// The acting caller and the tenant scope of the request.
    ///
    /// An unauthenticated caller carries no tenant, but the request still
    /// names one.
    pub fn resolve(&self) -> anyhow::Result<(Actor, TenantId)> {
        let tenant = self
            .tenant
            .clone()
            .ok_or_else(|| anyhow::anyhow!("--tenant is required (or set BOTGATE_TENANT)"))?;

        let actor = match self.role {
            ActorRole::Administrator => Actor::administrator(tenant.clone()),
            ActorRole::Agent => Actor::agent(tenant.clone()),
            ActorRole::Unauthenticated => Actor::anonymous(),
        };
        Ok((actor, tenant))
    }
}

#[derive(Subcommand)]
pub enum BotCommand {
    /// List bots visible to the tenant (its own plus global bots).
    #[command(alias = "ls")]
    List,

    /// Show one bot.
    Show {
        /// Bot ID.
        id: BotId,
    },

    /// Create a tenant bot and print its first access token.
    Create {
        /// Display name.
        name: String,

        /// Short description.
        #[arg(long, short)]
        description: Option<String>,

        /// Endpoint that receives the bot's outgoing events.
        #[arg(long)]
        outgoing_url: Option<String>,
    },

    /// Update a bot's metadata or avatar.
    Update {
        /// Bot ID.
        id: BotId,

        /// New display name.
        #[arg(long)]
        name: Option<String>,

        /// New description (empty clears it).
        #[arg(long, short)]
        description: Option<String>,

        /// New outgoing endpoint (empty clears it).
        #[arg(long)]
        outgoing_url: Option<String>,

        /// Upload an avatar image from a local file.
        #[arg(long, conflicts_with = "avatar_url")]
        avatar_file: Option<std::path::PathBuf>,

        /// Fetch the avatar from a URL in the background.
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Delete a bot, its credential and its avatar.
    #[command(alias = "rm")]
    Delete {
        /// Bot ID.
        id: BotId,

        /// Skip confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },

    /// Remove a bot's avatar.
    #[command(name = "remove-avatar")]
    RemoveAvatar {
        /// Bot ID.
        id: BotId,
    },

    /// Rotate a bot's access token. The old token stops working immediately.
    #[command(name = "reset-token")]
    ResetToken {
        /// Bot ID.
        id: BotId,
    },
}

#[derive(Subcommand)]
pub enum SystemCommand {
    /// Provision a global bot and print its only copy of the token.
    Provision {
        /// Display name.
        name: String,

        /// Short description.
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List global bots.
    #[command(alias = "ls")]
    List,

    /// Rotate a global bot's access token.
    Rotate {
        /// Bot ID.
        id: BotId,
    },

    /// Delete a global bot and its credential.
    #[command(alias = "rm")]
    Retire {
        /// Bot ID.
        id: BotId,

        /// Skip confirmation prompt.
        #[arg(long, short)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum JobsCommand {
    /// List pending jobs, oldest first.
    #[command(alias = "ls")]
    List,

    /// Mark a pending job as finished.
    ///
    /// Finishing an avatar fetch as done records the fetched avatar on its bot.
    Finish {
        /// Job ID.
        id: uuid::Uuid,

        /// Record the job as failed instead of done.
        #[arg(long)]
        failed: bool,
    },

    /// Delete settled jobs older than the given age.
    Prune {
        /// Minimum age in days.
        #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..))]
        older_than_days: u32,
    },
}
