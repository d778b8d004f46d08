//! Session client for the Gravitas API.
//!
//! # Design
//! `GravClient` translates typed calls into `HttpCrud` requests and unwraps
//! the response envelope into a typed value or a `GravError`. It holds no
//! session token of its own: the server-side session lives in the cookie jar
//! of the transport, and `SessionState` only records what the last
//! login-path call concluded.
//!
//! Calls are blocking and the client is not meant to be shared across
//! threads; wrap it in a lock if that is needed.

use tracing::{info, warn};

use crate::config::{ClientBuilder, ClientConfig};
use crate::envelope::{Envelope, ErrorKind};
use crate::error::{GravError, Result};
use crate::transport::{HttpCrud, Transport, UreqTransport};
use crate::types::{ClientQuery, ClientRecord, CrudMethod, LoginRequest, UserRecord, MAX_CLIENT_ID};

/// Endpoint for login, logout and session checks.
pub const LOGIN_PATH: &str = "login";

/// What the client last learned about its server-side session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated,
    /// The last login-path call failed; the server-side state is unknown.
    Error,
}

/// Blocking client for the Gravitas API.
#[derive(Debug)]
pub struct GravClient<T = UreqTransport> {
    config: ClientConfig,
    crud: HttpCrud<T>,
    state: SessionState,
}

impl GravClient {
    /// Connect to `hoststring` (e.g. `https://10.10.10.10:4443`).
    ///
    /// Fails with a `Config` error for anything but an `https` URL. No
    /// request is sent until the first call.
    pub fn new(hoststring: &str, ssl_verify: bool) -> Result<Self> {
        ClientBuilder::new()
            .host(hoststring)
            .ssl_verify(ssl_verify)
            .build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> GravClient<T> {
    /// Use a custom transport with an already validated config.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let crud = HttpCrud::new(config.host.clone(), config.ssl_verify, transport);
        Self {
            config,
            crud,
            state: SessionState::Anonymous,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn crud(&self) -> &HttpCrud<T> {
        &self.crud
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// `host[:port]` of the server.
    pub fn host(&self) -> String {
        self.config.netloc()
    }

    /// Record the outcome of a login-path call.
    fn track<V>(&mut self, result: Result<V>, on_success: SessionState) -> Result<V> {
        self.state = match &result {
            Ok(_) => on_success,
            Err(_) => SessionState::Error,
        };
        result
    }

    fn change_password_hint(&self) -> String {
        format!(
            "Please log in with a browser to https://{} to change your password",
            self.config.netloc()
        )
    }

    /// Log in and establish a server-side session.
    ///
    /// A successful envelope is not enough: if the returned user must change
    /// their password, or it has expired, the call fails and the session is
    /// not considered established.
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let result = self.try_login(username, password);
        if let Err(e) = &result {
            warn!(user = username, error = %e, "gravitas login failed");
        }
        self.track(result, SessionState::Authenticated)
    }

    fn try_login(&self, username: &str, password: &str) -> Result<()> {
        let payload = LoginRequest {
            user: username.to_string(),
            password: password.to_string(),
        };
        let response = self.crud.create(LOGIN_PATH, &payload)?;
        let envelope = Envelope::validate(response, ErrorKind::Auth)?;

        let user = envelope
            .into_rows()
            .into_iter()
            .next()
            .map(UserRecord::from)
            .ok_or_else(|| GravError::Auth("No user data received".to_string()))?;

        if user.force_password_change() {
            return Err(GravError::Auth(format!(
                "Password must be changed. {}",
                self.change_password_hint()
            )));
        }
        if user.password_expired() {
            return Err(GravError::Auth(format!(
                "Password has expired. {}",
                self.change_password_hint()
            )));
        }

        info!(user = username, host = %self.config.netloc(), "gravitas login succeeded");
        Ok(())
    }

    /// End the current server-side session.
    pub fn logout(&mut self) -> Result<()> {
        let result = self
            .crud
            .delete(LOGIN_PATH, &[])
            .and_then(|response| Envelope::validate(response, ErrorKind::Auth))
            .map(|_| ());
        match &result {
            Ok(()) => info!(host = %self.config.netloc(), "gravitas logout succeeded"),
            Err(e) => warn!(error = %e, "gravitas logout failed"),
        }
        self.track(result, SessionState::Anonymous)
    }

    /// Ask the server whether this client is logged in.
    ///
    /// Returns the current user, or `None` when the server reports no
    /// session. A malformed or unsuccessful envelope is an `Auth` error.
    pub fn login_session_check(&mut self) -> Result<Option<UserRecord>> {
        let result = self
            .crud
            .read(LOGIN_PATH, &[])
            .and_then(|response| Envelope::validate(response, ErrorKind::Auth))
            .map(|envelope| envelope.into_rows().into_iter().next().map(UserRecord::from));
        self.state = match &result {
            Ok(Some(_)) => SessionState::Authenticated,
            Ok(None) => SessionState::Anonymous,
            Err(_) => SessionState::Error,
        };
        result
    }

    /// Work with client records. Only `CrudMethod::Read` is supported.
    ///
    /// With `query.client_id == 0` every client is listed (possibly none);
    /// otherwise exactly that client is fetched and a missing one is an
    /// error.
    pub fn clients(&self, method: CrudMethod, query: &ClientQuery) -> Result<Vec<ClientRecord>> {
        match method {
            CrudMethod::Read => self.read_clients(query),
            CrudMethod::Create | CrudMethod::Update | CrudMethod::Delete => {
                Err(GravError::General("Method not implemented yet!".to_string()))
            }
        }
    }

    fn read_clients(&self, query: &ClientQuery) -> Result<Vec<ClientRecord>> {
        if query.client_id > MAX_CLIENT_ID {
            return Err(GravError::General(format!(
                "Invalid client ID `{}`, must be between 1 and {MAX_CLIENT_ID}",
                query.client_id
            )));
        }

        let response = self.crud.read(&query.path(), &query.params())?;
        let rows = Envelope::validate(response, ErrorKind::General)?.into_rows();

        if rows.is_empty() && query.client_id > 0 {
            return Err(GravError::General(format!(
                "Client ID `{}` not found!",
                query.client_id
            )));
        }
        Ok(rows.into_iter().map(ClientRecord::from).collect())
    }
}
