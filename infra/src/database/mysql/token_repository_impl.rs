//! MySQL implementation of the TokenRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use tw_core::domain::entities::token::RefreshToken;
use tw_core::errors::DomainError;
use tw_core::repositories::TokenRepository;

const SELECT_COLUMNS: &str = "id, token_hash, subject, expires_at, is_revoked, created_at, \
                              updated_at, device_info, ip_address";

/// MySQL implementation of TokenRepository
///
/// Records live in `refresh_tokens`, unique on `token_hash`.
#[derive(Clone)]
pub struct MySqlTokenRepository {
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> Result<RefreshToken, DomainError> {
        let id: String = row.try_get("id").map_err(column_error("id"))?;

        Ok(RefreshToken {
            id: Uuid::parse_str(&id)
                .map_err(|e| DomainError::internal(format!("Invalid token UUID: {}", e)))?,
            token_hash: row.try_get("token_hash").map_err(column_error("token_hash"))?,
            subject: row.try_get("subject").map_err(column_error("subject"))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(column_error("expires_at"))?,
            is_revoked: row.try_get("is_revoked").map_err(column_error("is_revoked"))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(column_error("created_at"))?,
            updated_at: row
                .try_get::<Option<DateTime<Utc>>, _>("updated_at")
                .map_err(column_error("updated_at"))?,
            device_info: row.try_get("device_info").map_err(column_error("device_info"))?,
            ip_address: row.try_get("ip_address").map_err(column_error("ip_address"))?,
        })
    }

    fn rows_to_tokens(rows: &[sqlx::mysql::MySqlRow]) -> Result<Vec<RefreshToken>, DomainError> {
        rows.iter().map(Self::row_to_token).collect()
    }
}

fn column_error(column: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::internal(format!("Failed to get {}: {}", column, e))
}

fn storage_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| {
        tracing::error!("Token store failed to {}: {}", action, e);
        DomainError::storage(format!("Failed to {}: {}", action, e))
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let query = r#"
            INSERT INTO refresh_tokens (
                id, token_hash, subject, expires_at, is_revoked, created_at,
                updated_at, device_info, ip_address
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        let result = sqlx::query(query)
            .bind(token.id.to_string())
            .bind(&token.token_hash)
            .bind(&token.subject)
            .bind(token.expires_at)
            .bind(token.is_revoked)
            .bind(token.created_at)
            .bind(token.updated_at)
            .bind(&token.device_info)
            .bind(&token.ip_address)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(token),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::Conflict {
                    message: "refresh token already exists".to_string(),
                })
            }
            Err(e) => Err(storage_error("save refresh token")(e)),
        }
    }

    async fn find_by_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE token_hash = ? LIMIT 1",
            SELECT_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("find refresh token"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("SELECT {} FROM refresh_tokens WHERE id = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error("find token by id"))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_all_by_subject(&self, subject: &str) -> Result<Vec<RefreshToken>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE subject = ? ORDER BY created_at DESC",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(subject)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error("list tokens for subject"))?;

        Self::rows_to_tokens(&rows)
    }

    async fn mark_revoked(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, DomainError> {
        // Conditional update: only the caller that flips the flag sees a row
        let query = r#"
            UPDATE refresh_tokens
            SET is_revoked = TRUE, updated_at = ?
            WHERE token_hash = ? AND is_revoked = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(at)
            .bind(token_hash)
            .execute(&self.pool)
            .await
            .map_err(storage_error("revoke refresh token"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(storage_error("delete expired tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_all_by_subject(&self, subject: &str) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE subject = ?")
            .bind(subject)
            .execute(&self.pool)
            .await
            .map_err(storage_error("delete tokens for subject"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn count_active_by_subject(
        &self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let query = r#"
            SELECT COUNT(*) AS active
            FROM refresh_tokens
            WHERE subject = ? AND is_revoked = FALSE AND expires_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(subject)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("count active tokens"))?;

        let count: i64 = row.try_get("active").map_err(column_error("active"))?;
        Ok(count.max(0) as usize)
    }
}
