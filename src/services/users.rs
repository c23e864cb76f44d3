// src/services/users.rs
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::models::{NewUser, User};
use crate::common::{generate_user_id, safe_email_log, ApiError};

/// Persistence for local user records
#[derive(Debug, Clone)]
pub struct UserService {
    db: SqlitePool,
}

impl UserService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Vec<User>, ApiError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, family_name, given_name, picture, locale,
                   google_id, verified_email, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_all(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        Ok(users)
    }

    /// Insert a record; a concurrent insert for the same email is silently
    /// dropped by the UNIQUE constraint. Returns whether a row was written.
    pub async fn insert_user(&self, user: &NewUser) -> Result<bool, ApiError> {
        let id = generate_user_id();

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, name, family_name, given_name, picture, locale,
                               google_id, verified_email)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(&user.email)
        .bind(user.name.as_deref())
        .bind(user.family_name.as_deref())
        .bind(user.given_name.as_deref())
        .bind(user.picture.as_deref())
        .bind(user.locale.as_deref())
        .bind(&user.google_id)
        .bind(user.verified_email)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        let created = result.rows_affected() == 1;
        if created {
            info!(
                user_id = %id,
                email = %safe_email_log(&user.email),
                "Created user record from Google profile"
            );
        }
        Ok(created)
    }

    /// Insert-if-absent keyed by email. Existing records are never updated.
    pub async fn create_if_absent(&self, user: &NewUser) -> Result<bool, ApiError> {
        let existing = self.find_by_email(&user.email).await?;

        if !existing.is_empty() {
            debug!(
                email = %safe_email_log(&user.email),
                matches = existing.len(),
                "User already exists, skipping creation"
            );
            return Ok(false);
        }

        self.insert_user(user).await
    }
}
