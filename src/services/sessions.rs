// src/services/sessions.rs
//! Server-side session storage
//!
//! The browser only holds an opaque id; the auth slots live in the
//! `sessions` table as JSON.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::auth::models::SessionData;

/// Lifetime of a session that was never marked permanent
const TRANSIENT_SESSION_HOURS: i64 = 24;

/// Fixed-width UTC timestamp so `expires_at` compares correctly as text
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub data: SessionData,
    pub permanent: bool,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    db: SqlitePool,
    permanent_lifetime: Duration,
}

impl SessionStore {
    pub fn new(db: SqlitePool, lifetime_days: i64) -> Self {
        Self {
            db,
            permanent_lifetime: Duration::days(lifetime_days),
        }
    }

    pub fn permanent_lifetime(&self) -> Duration {
        self.permanent_lifetime
    }

    /// Load a live session; expired or unknown ids yield `None`
    pub async fn load(&self, id: &str) -> Result<Option<SessionRecord>, SessionError> {
        let row: Option<(String, bool, String)> =
            sqlx::query_as("SELECT data, permanent, expires_at FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        let Some((data, permanent, expires_at)) = row else {
            return Ok(None);
        };

        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map(|dt| dt.with_timezone(&Utc) <= Utc::now())
            .unwrap_or(true);
        if expired {
            debug!("Ignoring expired session");
            return Ok(None);
        }

        Ok(Some(SessionRecord {
            data: serde_json::from_str(&data)?,
            permanent,
        }))
    }

    pub async fn save(
        &self,
        id: &str,
        data: &SessionData,
        permanent: bool,
    ) -> Result<(), SessionError> {
        let lifetime = if permanent {
            self.permanent_lifetime
        } else {
            Duration::hours(TRANSIENT_SESSION_HOURS)
        };
        let expires_at = timestamp(Utc::now() + lifetime);
        let json = serde_json::to_string(data)?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, data, permanent, expires_at, updated_at)
            VALUES (?, ?, ?, ?, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                permanent = excluded.permanent,
                expires_at = excluded.expires_at,
                updated_at = datetime('now')
            "#,
        )
        .bind(id)
        .bind(&json)
        .bind(permanent)
        .bind(&expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn delete_expired(&self) -> Result<u64, SessionError> {
        let now = timestamp(Utc::now());
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(&now)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Purge expired sessions every `interval` for the life of the process
    pub fn start_cleanup_task(self, interval: StdDuration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.delete_expired().await {
                    Ok(0) => {}
                    Ok(removed) => info!(removed = removed, "Purged expired sessions"),
                    Err(e) => error!(error = %e, "Failed to purge expired sessions"),
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::migrations::run_migrations;
    use crate::services::google::OAuthTokens;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_store() -> SessionStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SessionStore::new(pool, 31)
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = setup_store().await;
        let data = SessionData {
            state: Some("state-1".to_string()),
            oauth_tokens: Some(OAuthTokens {
                access_token: "at".to_string(),
                refresh_token: Some("rt".to_string()),
                token_type: "Bearer".to_string(),
                expires_in: Some(3600),
                expires_at: None,
                scope: None,
                id_token: None,
            }),
        };

        store.save("sid", &data, true).await.unwrap();
        let record = store.load("sid").await.unwrap().unwrap();
        assert_eq!(record.data, data);
        assert!(record.permanent);

        store.save("sid", &SessionData::default(), true).await.unwrap();
        let record = store.load("sid").await.unwrap().unwrap();
        assert!(record.data.oauth_tokens.is_none());
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = setup_store().await;
        assert!(store.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_ignored_and_purged() {
        let store = setup_store().await;
        store.save("live", &SessionData::default(), false).await.unwrap();
        sqlx::query("INSERT INTO sessions (id, data, permanent, expires_at) VALUES ('old', '{}', 1, ?)")
            .bind(timestamp(Utc::now() - Duration::days(1)))
            .execute(&store.db)
            .await
            .unwrap();

        assert!(store.load("old").await.unwrap().is_none());
        assert_eq!(store.delete_expired().await.unwrap(), 1);
        assert!(store.load("live").await.unwrap().is_some());
    }
}
