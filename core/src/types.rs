//! Records, verbs and request payloads for the Gravitas API.
//!
//! # Design
//! The server documents only a handful of keys per record and sends more
//! than it documents, some with undocumented types. Records are therefore
//! open JSON maps wrapped in newtypes that expose typed accessors for the
//! known keys and leave everything else reachable through `get`.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GravError;

/// An open JSON object as returned inside an envelope's `rows`.
pub type Record = serde_json::Map<String, Value>;

/// Largest client ID the API accepts.
pub const MAX_CLIENT_ID: u32 = 9999;

/// Default `limit` sent with client reads.
pub const DEFAULT_CLIENT_LIMIT: u32 = 100;

/// JSON truthiness for the server's flag fields, which are not consistently
/// sent as booleans.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A user row returned by `login` and `login_session_check`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub Record);

impl UserRecord {
    pub fn username(&self) -> Option<&str> {
        self.0.get("USER").and_then(Value::as_str)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.get("USER_ID").and_then(Value::as_i64)
    }

    /// Administrative status of the user.
    pub fn is_root(&self) -> bool {
        self.0.get("ROOT").is_some_and(truthy)
    }

    /// The last account this user accessed.
    pub fn last_account(&self) -> Option<i64> {
        self.0.get("LAST_ACCT").and_then(Value::as_i64)
    }

    /// Password expiry date, formatted `YYYY-MM-DD`.
    pub fn password_expires(&self) -> Option<&str> {
        self.0.get("PWD_EXPIRE").and_then(Value::as_str)
    }

    /// Undocumented by the server; passed through untouched.
    pub fn next_pwned(&self) -> Option<&Value> {
        self.0.get("NEXT_PWNED").filter(|v| !v.is_null())
    }

    pub fn force_password_change(&self) -> bool {
        self.0.get("FORCE_PWD_CHANGE").is_some_and(truthy)
    }

    /// A missing flag counts as not expired.
    pub fn password_expired(&self) -> bool {
        self.0.get("expired_pwd").is_some_and(truthy)
    }

    pub fn into_inner(self) -> Record {
        self.0
    }
}

impl Deref for UserRecord {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl From<Record> for UserRecord {
    fn from(record: Record) -> Self {
        UserRecord(record)
    }
}

/// A client row returned by the `clients` endpoint. Fields are provider
/// defined; only the identifying ones get accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientRecord(pub Record);

impl ClientRecord {
    pub fn client_id(&self) -> Option<i64> {
        self.0.get("CLIENT_ID").and_then(Value::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("NAME").and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Record {
        self.0
    }
}

impl Deref for ClientRecord {
    type Target = Record;

    fn deref(&self) -> &Record {
        &self.0
    }
}

impl From<Record> for ClientRecord {
    fn from(record: Record) -> Self {
        ClientRecord(record)
    }
}

/// The CRUD operation requested from an endpoint.
///
/// Discriminants match the integer constants the API documentation uses
/// (`READ = 1` through `DELETE = 4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CrudMethod {
    Read = 1,
    Create = 2,
    Update = 3,
    Delete = 4,
}

impl TryFrom<u8> for CrudMethod {
    type Error = GravError;

    fn try_from(value: u8) -> Result<Self, GravError> {
        match value {
            1 => Ok(CrudMethod::Read),
            2 => Ok(CrudMethod::Create),
            3 => Ok(CrudMethod::Update),
            4 => Ok(CrudMethod::Delete),
            other => Err(GravError::General(format!("Invalid method specified: {other}"))),
        }
    }
}

/// Arguments to `GravClient::clients`.
///
/// The server currently ignores `fields`, `order` and `limit`; they are still
/// sent so callers keep working once filtering lands server-side.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientQuery {
    /// `0` reads every client, `1..=9999` reads a single one.
    pub client_id: u32,
    pub fields: Vec<String>,
    /// Ignored by the server when `client_id` is set.
    pub order: Vec<String>,
    /// `0` sends no limit.
    pub limit: u32,
    /// Payload for create/update.
    pub data: Record,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            client_id: 0,
            fields: Vec::new(),
            order: Vec::new(),
            limit: DEFAULT_CLIENT_LIMIT,
            data: Record::new(),
        }
    }
}

impl ClientQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client_id(mut self, id: u32) -> Self {
        self.client_id = id;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn data(mut self, data: Record) -> Self {
        self.data = data;
        self
    }

    /// Query parameters in the order the API expects them.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.fields.is_empty() {
            params.push(("fields".to_string(), self.fields.join(",")));
        }
        if self.limit > 0 {
            params.push(("limit".to_string(), self.limit.to_string()));
        }
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        params
    }

    /// `clients` for a full listing, `clients/<id>` for a single lookup.
    pub fn path(&self) -> String {
        if self.client_id > 0 {
            format!("clients/{}", self.client_id)
        } else {
            "clients".to_string()
        }
    }
}

/// Credentials posted to `login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "USER")]
    pub user: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}
