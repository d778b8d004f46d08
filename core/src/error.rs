//! Error types for the Gravitas SDK.
//!
//! # Design
//! Three categories terminate a call. `Config` is raised while building a
//! client, before any request goes out. `Auth` covers every failure on the
//! `login` path, including a successful envelope that still refuses the
//! session (expired or force-changed password). `General` covers bad
//! arguments, unimplemented verbs and failed reads on non-login paths.
//! Callers branch on the category, so the two envelope failures stay distinct
//! even though the wire shape is identical.

use thiserror::Error;

/// Errors returned by `GravClient` and its builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GravError {
    /// Invalid host string or unsupported scheme at construction time.
    #[error("Configuration error: `{0}`")]
    Config(String),

    /// Failed login, logout or session check.
    #[error("Login error: `{0}`")]
    Auth(String),

    /// Invalid argument, unimplemented verb, or failed request on a
    /// non-login path.
    #[error("General error: `{0}`")]
    General(String),
}

impl GravError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, GravError::Config(_))
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, GravError::Auth(_))
    }

    pub fn is_general_error(&self) -> bool {
        matches!(self, GravError::General(_))
    }

    /// The bare message, without the category prefix added by `Display`.
    pub fn message(&self) -> &str {
        match self {
            GravError::Config(msg) | GravError::Auth(msg) | GravError::General(msg) => msg,
        }
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, GravError>;

/// A network-level failure raised by a `Transport` before any HTTP status
/// was received (DNS, connect, TLS, timeout).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        TransportError(err.to_string())
    }
}
