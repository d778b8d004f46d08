//! The `{success, error?, rows?}` response envelope and its validator.
//!
//! Every endpoint wraps its payload the same way, but failures on the
//! `login` path are authentication errors while failures elsewhere are
//! general errors. `Envelope::validate` takes the category as a parameter so
//! both call sites share one set of rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GravError, Result};
use crate::transport::CrudResponse;
use crate::types::Record;

/// Fallback message when a failed response carries no `error` of its own.
pub const INVALID_API_DATA: &str = "Invalid API data received";

/// The error category a failed envelope is reported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    General,
}

impl ErrorKind {
    /// Wrap a locally generated message.
    pub fn error(self, message: impl Into<String>) -> GravError {
        match self {
            ErrorKind::Auth => GravError::Auth(message.into()),
            ErrorKind::General => GravError::General(message.into()),
        }
    }

    /// Wrap a message that came from the server's `error` field.
    pub fn server_error(self, message: &str) -> GravError {
        match self {
            ErrorKind::Auth => GravError::Auth(message.to_string()),
            ErrorKind::General => GravError::General(format!("Error received from API: {message}")),
        }
    }
}

/// A decoded response envelope. Unknown top-level keys land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Record>>,
    #[serde(flatten)]
    pub extra: Record,
}

impl Envelope {
    /// Check a CRUD result and decode its envelope, raising `kind` on any
    /// failure. Never returns an envelope with `success == false`.
    pub fn validate(response: CrudResponse, kind: ErrorKind) -> Result<Envelope> {
        let CrudResponse { ok, body } = response;
        let Value::Object(map) = body else {
            return Err(kind.error(INVALID_API_DATA));
        };

        let server_error = map.get("error").and_then(Value::as_str);
        let success = match map.get("success") {
            Some(Value::Bool(success)) => *success,
            Some(_) => return Err(kind.error("api response `success` key is not a boolean")),
            None if !ok => {
                return Err(match server_error {
                    Some(message) => kind.server_error(message),
                    None => kind.error(INVALID_API_DATA),
                })
            }
            None => return Err(kind.error("api response missing `success` key")),
        };

        if !success {
            return Err(kind.server_error(server_error.unwrap_or("unknown error")));
        }
        if !ok {
            // A non-2xx status overrides a body that claims success.
            return Err(match server_error {
                Some(message) => kind.server_error(message),
                None => kind.error(INVALID_API_DATA),
            });
        }

        serde_json::from_value(Value::Object(map))
            .map_err(|e| kind.error(format!("malformed API response: {e}")))
    }

    pub fn rows(&self) -> &[Record] {
        self.rows.as_deref().unwrap_or_default()
    }

    pub fn has_rows(&self) -> bool {
        !self.rows().is_empty()
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows.unwrap_or_default()
    }
}
