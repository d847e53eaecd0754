//! SQLite credential repository implementation.
//!
//! Stores only the token digest and the sealed token (BLOB). Sealing and
//! digesting happen in the credential service; this layer moves bytes.

use botgate_core::repository::credential::CredentialRepository;
use botgate_types::bot::BotId;
use botgate_types::credential::StoredCredential;
use botgate_types::error::RepositoryError;
use sqlx::Row;

use super::bot::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `CredentialRepository`.
#[derive(Clone)]
pub struct SqliteCredentialRepository {
    pool: DatabasePool,
}

impl SqliteCredentialRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn credential_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredCredential, RepositoryError> {
    let bot_id: String = row
        .try_get("bot_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let issued_at: String = row
        .try_get("issued_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(StoredCredential {
        bot_id: bot_id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?,
        token_hash: row
            .try_get("token_hash")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        sealed_token: row
            .try_get("sealed_token")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        issued_at: parse_datetime(&issued_at)?,
    })
}

fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE") => {
            RepositoryError::Conflict("token collision".to_string())
        }
        _ => RepositoryError::Query(err.to_string()),
    }
}

impl CredentialRepository for SqliteCredentialRepository {
    async fn get(&self, bot_id: &BotId) -> Result<Option<StoredCredential>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bot_credentials WHERE bot_id = ?")
            .bind(bot_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn get_by_hash(&self, token_hash: &str) -> Result<Option<StoredCredential>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bot_credentials WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(credential_from_row).transpose()
    }

    async fn replace(&self, credential: &StoredCredential) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE bot_credentials SET token_hash = ?, sealed_token = ?, issued_at = ?
             WHERE bot_id = ?",
        )
        .bind(&credential.token_hash)
        .bind(&credential.sealed_token)
        .bind(format_datetime(&credential.issued_at))
        .bind(credential.bot_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, bot_id: &BotId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bot_credentials WHERE bot_id = ?")
            .bind(bot_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
