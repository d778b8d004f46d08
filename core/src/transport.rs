//! Generic CRUD transport over HTTP.
//!
//! # Design
//! `HttpCrud` maps the four CRUD verbs onto GET/POST/PUT/DELETE against one
//! base URL. Each verb is split into a `build_*` half that produces an
//! `HttpRequest` and a shared `parse_response` half that turns an
//! `HttpResponse` into a `CrudResponse`; the `Transport` in between is the
//! only code that does I/O. There is no retry and no backoff: every call is a
//! single round trip bounded by the configured timeout.

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{GravError, Result, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes an `HttpRequest` and returns the response as data.
///
/// Non-2xx statuses must come back as `Ok`; `Err` is reserved for failures
/// where no response was received at all.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> std::result::Result<HttpResponse, TransportError>,
{
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent keeps a cookie jar, so the session cookie set by `login` rides
/// along on every later call made through the same transport.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_settings(
            config.ssl_verify,
            config.timeout,
            config.user_agent.clone(),
        )
    }

    pub fn with_settings(ssl_verify: bool, timeout: Duration, user_agent: Option<String>) -> Self {
        if !ssl_verify {
            warn!("TLS certificate verification is disabled");
        }
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!ssl_verify)
            .build();
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .tls_config(tls)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: user_agent
                .unwrap_or_else(|| format!("gravitas-sdk/{}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
    user_agent: &str,
) -> ureq::RequestBuilder<B> {
    builder = builder.header("user-agent", user_agent);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let ua = self.user_agent.as_str();
        let body = request.body.as_deref().unwrap_or_default();

        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(url), headers, ua).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(url), headers, ua).call(),
            HttpMethod::Post => with_headers(self.agent.post(url), headers, ua).send(body.as_bytes()),
            HttpMethod::Put => with_headers(self.agent.put(url), headers, ua).send(body.as_bytes()),
        }?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Outcome of one CRUD call: whether it succeeded at the HTTP level, and the
/// parsed JSON body (or an `{"error": ...}` description when it did not).
#[derive(Debug, Clone, PartialEq)]
pub struct CrudResponse {
    pub ok: bool,
    pub body: Value,
}

impl CrudResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            ok: false,
            body: json!({ "error": message }),
        }
    }
}

/// The generic CRUD object: four verbs against a shared base URL.
#[derive(Debug, Clone)]
pub struct HttpCrud<T> {
    base_url: Url,
    ssl_verify: bool,
    transport: T,
}

impl<T: Transport> HttpCrud<T> {
    /// `base_url` should end in `/`; `ClientConfig` guarantees this.
    pub fn new(base_url: Url, ssl_verify: bool, transport: T) -> Self {
        Self {
            base_url,
            ssl_verify,
            transport,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn ssl_verify(&self) -> bool {
        self.ssl_verify
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str, params: &[(String, String)]) -> Result<String> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GravError::General(format!("invalid request path `{path}`: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url.into())
    }

    fn json_body<B: Serialize + ?Sized>(payload: &B) -> Result<String> {
        serde_json::to_string(payload)
            .map_err(|e| GravError::General(format!("failed to serialize request: {e}")))
    }

    pub fn build_read(&self, path: &str, params: &[(String, String)]) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.url(path, params)?,
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        })
    }

    pub fn build_create<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(path, &[])?,
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(Self::json_body(payload)?),
        })
    }

    pub fn build_update<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Put,
            url: self.url(path, &[])?,
            headers: vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ],
            body: Some(Self::json_body(payload)?),
        })
    }

    pub fn build_delete(&self, path: &str, params: &[(String, String)]) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: self.url(path, params)?,
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
        })
    }

    /// Interpret a raw response. A JSON body is kept even on a non-2xx
    /// status so the server's `error` field reaches the caller.
    pub fn parse_response(&self, response: HttpResponse) -> CrudResponse {
        let ok = response.is_success();
        match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => CrudResponse { ok, body },
            Err(e) if ok => CrudResponse::failure(format!("invalid JSON in response: {e}")),
            Err(_) if response.body.trim().is_empty() => {
                CrudResponse::failure(format!("HTTP {}", response.status))
            }
            Err(_) => CrudResponse::failure(format!("HTTP {}: {}", response.status, response.body.trim())),
        }
    }

    /// Execute a built request and interpret the result.
    pub fn send(&self, request: HttpRequest) -> CrudResponse {
        debug!(method = %request.method, url = %request.url, "gravitas request");
        match self.transport.execute(&request) {
            Ok(response) => {
                debug!(status = response.status, "gravitas response");
                let parsed = self.parse_response(response);
                if !parsed.ok {
                    warn!(method = %request.method, url = %request.url, body = %parsed.body, "gravitas request failed");
                }
                parsed
            }
            Err(e) => {
                warn!(method = %request.method, url = %request.url, error = %e, "gravitas transport error");
                CrudResponse::failure(e.to_string())
            }
        }
    }

    pub fn read(&self, path: &str, params: &[(String, String)]) -> Result<CrudResponse> {
        Ok(self.send(self.build_read(path, params)?))
    }

    pub fn create<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<CrudResponse> {
        Ok(self.send(self.build_create(path, payload)?))
    }

    pub fn update<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<CrudResponse> {
        Ok(self.send(self.build_update(path, payload)?))
    }

    pub fn delete(&self, path: &str, params: &[(String, String)]) -> Result<CrudResponse> {
        Ok(self.send(self.build_delete(path, params)?))
    }
}
