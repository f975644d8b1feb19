//! Authentication types shared by the credential verifiers and the HTTP gate.

use std::fmt;

use secrecy::SecretString;
use thiserror::Error;

/// Proof of caller identity presented with a request.
///
/// Secret parts are wrapped so they never show up in `Debug` output or logs.
#[derive(Debug)]
pub enum Credential {
    /// `Authorization: Basic base64(username:password)`.
    Basic {
        username: String,
        password: SecretString,
    },
    /// `Authorization: Bearer <token>`.
    Bearer(SecretString),
}

/// The resolved caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// The deployment allows unauthenticated access.
    Anonymous,
    /// A verified user.
    User(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Anonymous => write!(f, "anonymous"),
            Identity::User(name) => write!(f, "{name}"),
        }
    }
}

/// Why a request was refused. Every variant maps to the same opaque 403.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no credential presented")]
    MissingCredential,

    #[error("malformed Authorization header: {0}")]
    MalformedHeader(String),

    #[error("credential type not supported by this backend")]
    UnsupportedCredential,

    #[error("invalid credentials for user '{0}'")]
    InvalidCredentials(String),

    #[error("all requests are denied by the configured backend")]
    Denied,

    #[error("credential backend error: {0}")]
    Backend(String),
}
