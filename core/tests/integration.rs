//! Full session lifecycle against the live mock server.
//!
//! Starts the mock server on a random port, then drives `GravClient` over
//! real HTTP with the `ureq` transport. The client only accepts `https`
//! hosts, so a loopback transport rewrites the configured base URL to the
//! mock server's plain-HTTP address before each request.

use std::net::SocketAddr;
use std::time::Duration;

use gravitas_sdk::{
    ClientConfig, ClientQuery, CrudMethod, GravClient, GravError, HttpRequest, HttpResponse, SessionState,
    Transport, TransportError, UreqTransport,
};

const BASE_URL: &str = "https://gravitas.test";

/// Sends every request to the mock server instead of `BASE_URL`, sharing one
/// cookie jar across calls.
struct Loopback {
    inner: UreqTransport,
    target: String,
}

impl Transport for Loopback {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut rewritten = request.clone();
        rewritten.url = request.url.replacen(BASE_URL, &self.target, 1);
        self.inner.execute(&rewritten)
    }
}

/// Start the mock server on a random port in a background runtime.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr) -> GravClient<Loopback> {
    let config = ClientConfig::new(BASE_URL, true).unwrap();
    let transport = Loopback {
        inner: UreqTransport::with_settings(true, Duration::from_secs(5), None),
        target: format!("http://{addr}"),
    };
    GravClient::with_transport(config, transport)
}

#[test]
fn session_lifecycle() {
    let mut client = client_for(start_server());

    // Step 1: no session yet.
    assert_eq!(client.login_session_check().unwrap(), None);
    assert_eq!(client.state(), SessionState::Anonymous);

    // Step 2: client reads are refused without a session.
    let err = client
        .clients(CrudMethod::Read, &ClientQuery::default())
        .unwrap_err();
    assert_eq!(err, GravError::General("Error received from API: Not logged in".into()));

    // Step 3: log in.
    client.login("restuser", "gravitas1234567890").unwrap();
    assert!(client.is_authenticated());

    // Step 4: the session cookie is carried by the transport.
    let user = client.login_session_check().unwrap().expect("logged in");
    assert_eq!(user.username(), Some("restuser"));
    assert_eq!(user.user_id(), Some(2));
    assert!(user.is_root());
    assert!(!user.password_expired());

    // Step 5: list every client; filters are sent but ignored server-side.
    let query = ClientQuery::new().fields(["NAME"]).order(["NAME"]).limit(1);
    let all = client.clients(CrudMethod::Read, &query).unwrap();
    assert_eq!(all.len(), 3);

    // Step 6: single lookup.
    let one = client
        .clients(CrudMethod::Read, &ClientQuery::new().client_id(100))
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].client_id(), Some(100));
    assert_eq!(one[0].name(), Some("Acme Corp"));

    // Step 7: unknown client.
    let err = client
        .clients(CrudMethod::Read, &ClientQuery::new().client_id(4242))
        .unwrap_err();
    assert_eq!(err, GravError::General("Client ID `4242` not found!".into()));

    // Step 8: writes are not implemented.
    let err = client
        .clients(CrudMethod::Create, &ClientQuery::default())
        .unwrap_err();
    assert_eq!(err, GravError::General("Method not implemented yet!".into()));

    // Step 9: log out.
    client.logout().unwrap();
    assert_eq!(client.state(), SessionState::Anonymous);
    assert_eq!(client.login_session_check().unwrap(), None);

    // Step 10: logging out twice is an auth error.
    let err = client.logout().unwrap_err();
    assert_eq!(err, GravError::Auth("Not logged in".into()));
    assert_eq!(client.state(), SessionState::Error);
}

#[test]
fn wrong_password_is_rejected() {
    let mut client = client_for(start_server());
    let err = client.login("restuser", "wrong").unwrap_err();
    assert_eq!(err, GravError::Auth("Invalid username or password".into()));
    assert!(!client.is_authenticated());
}

#[test]
fn expired_and_forced_passwords_block_login() {
    let addr = start_server();

    let mut client = client_for(addr);
    let err = client.login("olduser", "expired").unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.message().starts_with("Password has expired."));
    assert!(err.message().contains("https://gravitas.test"));

    let mut client = client_for(addr);
    let err = client.login("newuser", "changeme").unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.message().starts_with("Password must be changed."));
}

#[test]
fn unreachable_server_is_auth_error_on_login() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let mut client = client_for(addr);
    let err = client.login("restuser", "gravitas1234567890").unwrap_err();
    assert!(err.is_auth_error());
    assert!(err.message().starts_with("transport error"));

    let err = client
        .clients(CrudMethod::Read, &ClientQuery::default())
        .unwrap_err();
    assert!(err.is_general_error());
}
