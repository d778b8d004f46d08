//! Client configuration and builder.
//!
//! A host string such as `https://10.10.10.10:4443` is parsed once here; the
//! resulting `ClientConfig` is immutable for the life of the client.

use std::time::Duration;

use url::Url;

use crate::client::GravClient;
use crate::error::{GravError, Result};
use crate::transport::UreqTransport;

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The only scheme the API is served over.
pub const SUPPORTED_SCHEME: &str = "https";

pub const ENV_HOST: &str = "GRAVITAS_HOST";
pub const ENV_SSL_VERIFY: &str = "GRAVITAS_SSL_VERIFY";
pub const ENV_TIMEOUT_SECS: &str = "GRAVITAS_TIMEOUT_SECS";

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL, always `https` and always ending in `/`.
    pub host: Url,
    /// Verify the server's TLS certificate. Keep enabled in production.
    pub ssl_verify: bool,
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    /// Parse and validate a host string with default settings.
    pub fn new(hoststring: &str, ssl_verify: bool) -> Result<Self> {
        ClientBuilder::new()
            .host(hoststring)
            .ssl_verify(ssl_verify)
            .build_config()
    }

    /// `host[:port]` as shown to users, e.g. in password-change messages.
    pub fn netloc(&self) -> String {
        let host = self.host.host_str().unwrap_or_default();
        match self.host.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Builder for `ClientConfig` and `GravClient`.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    host: Option<String>,
    ssl_verify: bool,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            ssl_verify: true,
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Start from environment variables.
    ///
    /// - `GRAVITAS_HOST`: host string, e.g. `https://gravitas.example:4443`
    /// - `GRAVITAS_SSL_VERIFY`: `true`/`false`/`1`/`0`/`yes`/`no` (default true)
    /// - `GRAVITAS_TIMEOUT_SECS`: request timeout (default 30)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new();
        if let Some(host) = lookup(ENV_HOST) {
            builder = builder.host(host);
        }
        if let Some(raw) = lookup(ENV_SSL_VERIFY) {
            builder = builder.ssl_verify(parse_bool(ENV_SSL_VERIFY, &raw)?);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                GravError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got `{raw}`"))
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(builder)
    }

    pub fn host(mut self, hoststring: impl Into<String>) -> Self {
        self.host = Some(hoststring.into());
        self
    }

    pub fn ssl_verify(mut self, enabled: bool) -> Self {
        self.ssl_verify = enabled;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Validate the settings without creating a transport.
    pub fn build_config(self) -> Result<ClientConfig> {
        let raw = self
            .host
            .ok_or_else(|| GravError::Config("host is required".to_string()))?;

        let mut host = Url::parse(raw.trim())
            .map_err(|e| GravError::Config(format!("invalid url specified: `{e}`")))?;
        if host.scheme() != SUPPORTED_SCHEME {
            return Err(GravError::Config(format!(
                "invalid protocol specified `{}`, must be `{SUPPORTED_SCHEME}`",
                host.scheme()
            )));
        }
        if host.host_str().map_or(true, str::is_empty) {
            return Err(GravError::Config(format!("no host in `{raw}`")));
        }
        if !host.path().ends_with('/') {
            let path = format!("{}/", host.path());
            host.set_path(&path);
        }
        host.set_query(None);
        host.set_fragment(None);

        Ok(ClientConfig {
            host,
            ssl_verify: self.ssl_verify,
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }

    /// Build a client backed by the blocking `ureq` transport.
    pub fn build(self) -> Result<GravClient> {
        let config = self.build_config()?;
        let transport = UreqTransport::new(&config);
        Ok(GravClient::with_transport(config, transport))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GravError::Config(format!("{key} must be a boolean, got `{raw}`"))),
    }
}
