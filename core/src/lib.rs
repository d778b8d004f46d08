//! Blocking client SDK for the Gravitas HTTP JSON API.
//!
//! # Overview
//! `GravClient` opens a session against a Gravitas server and exposes the
//! `login`, `logout`, `login_session_check` and `clients` calls. Every
//! response arrives wrapped in a `{success, error?, rows?}` envelope which is
//! unwrapped into a typed value or a `GravError`.
//!
//! ```no_run
//! use gravitas_sdk::{ClientQuery, CrudMethod, GravClient};
//!
//! # fn main() -> gravitas_sdk::Result<()> {
//! let mut sdk = GravClient::new("https://10.10.10.10:4443", true)?;
//! sdk.login("restuser", "gravitas1234567890")?;
//!
//! let clients = sdk.clients(CrudMethod::Read, &ClientQuery::new().client_id(100))?;
//! println!("{:?}", clients[0].name());
//!
//! sdk.logout()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Design
//! - `HttpCrud` maps READ/CREATE/UPDATE/DELETE onto GET/POST/PUT/DELETE and
//!   splits each call into `build_*` and `parse_response`, so the only I/O
//!   happens inside a `Transport`.
//! - `UreqTransport` is the default blocking transport; tests and embedders
//!   can pass any closure or type implementing `Transport`.
//! - `Envelope::validate` is the single place that decides whether a response
//!   succeeded, parameterised by the error category to raise.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::{GravClient, SessionState, LOGIN_PATH};
pub use config::{ClientBuilder, ClientConfig, DEFAULT_TIMEOUT};
pub use envelope::{Envelope, ErrorKind};
pub use error::{GravError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{CrudResponse, HttpCrud, Transport, UreqTransport};
pub use types::{ClientQuery, ClientRecord, CrudMethod, LoginRequest, Record, UserRecord};
