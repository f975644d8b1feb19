//! Credential store trait definition.

use dagctl_types::error::RepositoryError;
use secrecy::SecretString;

/// Backing store for username/password verification.
pub trait CredentialStore: Send + Sync {
    /// Check a password for `username`.
    ///
    /// Returns `Ok(false)` for unknown users and wrong passwords alike.
    fn verify_password(
        &self,
        username: &str,
        password: &SecretString,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
