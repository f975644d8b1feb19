//! Credential verification for the control API.
//!
//! `CredentialVerifier` turns the raw `Authorization` header (if any) into
//! an `Identity` or a typed `AuthFailure`. The HTTP layer applies it once, as
//! middleware, and refuses the request with an opaque 403 on any failure.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use dagctl_types::auth::{AuthFailure, Credential, Identity};
use dagctl_types::config::AuthBackendKind;
use secrecy::SecretString;

use crate::repository::credential::CredentialStore;

/// Verifies the credential presented with a request.
pub trait CredentialVerifier: Send + Sync {
    /// `authorization` is the raw header value, `None` when absent.
    fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> impl std::future::Future<Output = Result<Identity, AuthFailure>> + Send;
}

/// Parse an `Authorization` header value.
///
/// Supports `Basic <base64(user:password)>` and `Bearer <token>`; the scheme
/// name is case-insensitive.
pub fn parse_authorization_header(value: &str) -> Result<Credential, AuthFailure> {
    let value = value.trim();
    let (scheme, rest) = value
        .split_once(' ')
        .ok_or_else(|| AuthFailure::MalformedHeader("missing scheme".to_string()))?;
    let rest = rest.trim();

    if scheme.eq_ignore_ascii_case("basic") {
        let decoded = STANDARD
            .decode(rest)
            .map_err(|e| AuthFailure::MalformedHeader(format!("invalid base64: {e}")))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthFailure::MalformedHeader("credentials are not UTF-8".to_string()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthFailure::MalformedHeader("missing ':' separator".to_string()))?;
        if username.is_empty() {
            return Err(AuthFailure::MalformedHeader("empty username".to_string()));
        }
        Ok(Credential::Basic {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
        })
    } else if scheme.eq_ignore_ascii_case("bearer") {
        if rest.is_empty() {
            return Err(AuthFailure::MalformedHeader("empty bearer token".to_string()));
        }
        Ok(Credential::Bearer(SecretString::from(rest.to_string())))
    } else {
        Err(AuthFailure::MalformedHeader(format!(
            "unsupported scheme '{scheme}'"
        )))
    }
}

/// Basic-auth verification against a `CredentialStore`.
pub struct PasswordVerifier<S: CredentialStore> {
    store: S,
}

impl<S: CredentialStore> PasswordVerifier<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: CredentialStore> CredentialVerifier for PasswordVerifier<S> {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthFailure> {
        let header = authorization.ok_or(AuthFailure::MissingCredential)?;

        match parse_authorization_header(header)? {
            Credential::Basic { username, password } => {
                match self.store.verify_password(&username, &password).await {
                    Ok(true) => Ok(Identity::User(username)),
                    Ok(false) => Err(AuthFailure::InvalidCredentials(username)),
                    Err(e) => Err(AuthFailure::Backend(e.to_string())),
                }
            }
            Credential::Bearer(_) => Err(AuthFailure::UnsupportedCredential),
        }
    }
}

/// The verifier selected by configuration.
pub enum ConfiguredVerifier<S: CredentialStore> {
    AllowAll,
    DenyAll,
    Password(PasswordVerifier<S>),
}

impl<S: CredentialStore> ConfiguredVerifier<S> {
    /// Build the verifier for `kind`. The store is only kept for `Password`.
    pub fn from_kind(kind: AuthBackendKind, store: S) -> Self {
        match kind {
            AuthBackendKind::AllowAll => ConfiguredVerifier::AllowAll,
            AuthBackendKind::DenyAll => ConfiguredVerifier::DenyAll,
            AuthBackendKind::Password => ConfiguredVerifier::Password(PasswordVerifier::new(store)),
        }
    }
}

impl<S: CredentialStore> CredentialVerifier for ConfiguredVerifier<S> {
    async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity, AuthFailure> {
        match self {
            ConfiguredVerifier::AllowAll => Ok(Identity::Anonymous),
            ConfiguredVerifier::DenyAll => Err(AuthFailure::Denied),
            ConfiguredVerifier::Password(verifier) => verifier.authenticate(authorization).await,
        }
    }
}
