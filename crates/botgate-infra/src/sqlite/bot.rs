//! SQLite bot repository implementation.
//!
//! Implements `BotRepository` from `botgate-core` using sqlx with split read/write pools.

use botgate_core::repository::SortOrder;
use botgate_core::repository::bot::{BotFilter, BotRepository, BotScope};
use botgate_types::bot::{AvatarRef, Bot, BotId, BotOwner, TenantId};
use botgate_types::credential::StoredCredential;
use botgate_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `BotRepository`.
#[derive(Clone)]
pub struct SqliteBotRepository {
    pool: DatabasePool,
}

impl SqliteBotRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Bot.
struct BotRow {
    id: String,
    owner_tenant_id: Option<String>,
    name: String,
    description: Option<String>,
    outgoing_url: Option<String>,
    avatar_thumbnail: Option<String>,
    created_at: String,
    updated_at: String,
}

impl BotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_tenant_id: row.try_get("owner_tenant_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            outgoing_url: row.try_get("outgoing_url")?,
            avatar_thumbnail: row.try_get("avatar_thumbnail")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_bot(self) -> Result<Bot, RepositoryError> {
        let id = self
            .id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?;

        let owner = match self.owner_tenant_id {
            None => BotOwner::Global,
            Some(tenant) => BotOwner::Tenant(
                tenant
                    .parse::<TenantId>()
                    .map_err(|e| RepositoryError::Query(format!("invalid tenant id: {e}")))?,
            ),
        };

        Ok(Bot {
            id,
            owner,
            name: self.name,
            description: self.description,
            outgoing_url: self.outgoing_url,
            avatar: self
                .avatar_thumbnail
                .map(|thumbnail| AvatarRef { thumbnail }),
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn owner_column(owner: &BotOwner) -> Option<String> {
    owner.tenant_id().map(ToString::to_string)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

impl BotRepository for SqliteBotRepository {
    async fn create(&self, bot: &Bot, credential: &StoredCredential) -> Result<Bot, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let inserted = sqlx::query(
            "INSERT INTO bots (id, owner_tenant_id, name, description, outgoing_url, avatar_thumbnail, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bot.id.to_string())
        .bind(owner_column(&bot.owner))
        .bind(&bot.name)
        .bind(&bot.description)
        .bind(&bot.outgoing_url)
        .bind(bot.avatar.as_ref().map(|a| a.thumbnail.clone()))
        .bind(format_datetime(&bot.created_at))
        .bind(format_datetime(&bot.updated_at))
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Conflict(format!(
                    "bot '{}' already exists",
                    bot.id
                )));
            }
            Err(e) => return Err(RepositoryError::Query(e.to_string())),
        }

        let inserted = sqlx::query(
            "INSERT INTO bot_credentials (bot_id, token_hash, sealed_token, issued_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(credential.bot_id.to_string())
        .bind(&credential.token_hash)
        .bind(&credential.sealed_token)
        .bind(format_datetime(&credential.issued_at))
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Conflict("token collision".to_string()));
            }
            Err(e) => return Err(RepositoryError::Query(e.to_string())),
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(bot.clone())
    }

    async fn get_by_id(&self, id: &BotId) -> Result<Option<Bot>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let bot_row =
                    BotRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(bot_row.into_bot()?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &BotFilter) -> Result<Vec<Bot>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM bots");
        let mut binds: Vec<String> = Vec::new();

        match &filter.scope {
            BotScope::Global => sql.push_str(" WHERE owner_tenant_id IS NULL"),
            BotScope::VisibleTo(tenant) => {
                sql.push_str(" WHERE (owner_tenant_id IS NULL OR owner_tenant_id = ?)");
                binds.push(tenant.to_string());
            }
        }

        // Whitelist allowed sort fields to prevent SQL injection
        let safe_sort = match filter.sort_by.as_deref() {
            Some(field @ ("name" | "created_at" | "updated_at")) => field,
            _ => "created_at",
        };
        let order = match filter.sort_order.unwrap_or_default() {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        // UUID v7 ids are time-ordered, so they break created_at ties.
        sql.push_str(&format!(" ORDER BY {safe_sort} {order}, id {order}"));

        let mut query = sqlx::query(&sql);
        for value in &binds {
            query = query.bind(value);
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut bots = Vec::with_capacity(rows.len());
        for row in &rows {
            let bot_row =
                BotRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            bots.push(bot_row.into_bot()?);
        }

        Ok(bots)
    }

    async fn update(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bots SET name = ?, description = ?, outgoing_url = ?, avatar_thumbnail = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&bot.name)
        .bind(&bot.description)
        .bind(&bot.outgoing_url)
        .bind(bot.avatar.as_ref().map(|a| a.thumbnail.clone()))
        .bind(format_datetime(&bot.updated_at))
        .bind(bot.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(bot.clone())
    }

    async fn delete(&self, id: &BotId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
