//! API user store for the password auth backend.
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`), which
//! carry their own salt and parameters.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Utc;
use dagctl_core::repository::credential::CredentialStore;
use dagctl_types::error::RepositoryError;
use secrecy::{ExposeSecret, SecretString};

use super::is_unique_violation;
use super::pool::DatabasePool;

/// SQLite-backed `CredentialStore`.
#[derive(Clone)]
pub struct SqliteUserStore {
    pool: DatabasePool,
}

impl SqliteUserStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create a user. Fails with `Conflict` if the username is taken.
    pub async fn add_user(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<(), RepositoryError> {
        let hash = hash_password(password)?;

        sqlx::query("INSERT INTO api_users (username, password_hash, created_at) VALUES (?, ?, ?)")
            .bind(username)
            .bind(hash)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(format!("user '{username}' already exists"))
                } else {
                    RepositoryError::Query(e.to_string())
                }
            })?;

        tracing::info!(username, "api user added");
        Ok(())
    }

    /// Usernames in alphabetical order.
    pub async fn list_users(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT username FROM api_users ORDER BY username")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

impl CredentialStore for SqliteUserStore {
    async fn verify_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT password_hash FROM api_users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some((stored,)) = row else {
            return Ok(false);
        };

        verify_hash(password, &stored)
    }
}

fn hash_password(password: &SecretString) -> Result<String, RepositoryError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| RepositoryError::Query(format!("argon2 hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. A mismatch is `Ok(false)`;
/// an unparseable stored value is an error.
fn verify_hash(password: &SecretString, stored: &str) -> Result<bool, RepositoryError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| RepositoryError::Query(format!("stored password hash is invalid: {e}")))?;
    match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(RepositoryError::Query(format!("argon2 verification failed: {e}"))),
    }
}
