//! Drive `GravClient` with the JSON fixtures in `test-vectors/`.
//!
//! Each case names the request the client should send, a simulated server
//! response, and either the expected result or the expected error category
//! and message. JSON is compared parsed, so key order never matters.

use std::cell::RefCell;

use gravitas_sdk::{
    ClientConfig, ClientQuery, CrudMethod, GravClient, GravError, HttpMethod, HttpRequest, HttpResponse,
    SessionState, TransportError,
};
use serde_json::Value;

const BASE_URL: &str = "https://grav.example:4443";

type Replay<'a> = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + 'a>;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn simulated(case: &Value) -> Option<HttpResponse> {
    let sim = case.get("simulated_response")?;
    Some(HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    })
}

/// Run `call` against a client whose transport answers with the case's
/// simulated response, returning the call's result and every request sent.
fn run_case<R>(
    case: &Value,
    call: impl for<'a> FnOnce(&mut GravClient<Replay<'a>>) -> R,
) -> (R, Vec<HttpRequest>) {
    let sent = RefCell::new(Vec::new());
    let response = simulated(case);
    let transport: Replay<'_> = Box::new(|req: &HttpRequest| {
        sent.borrow_mut().push(req.clone());
        response
            .clone()
            .ok_or_else(|| TransportError("no simulated response".to_string()))
    });
    let config = ClientConfig::new(BASE_URL, true).unwrap();
    let mut client = GravClient::with_transport(config, transport);
    let result = call(&mut client);
    drop(client);
    (result, sent.into_inner())
}

fn check_request(name: &str, case: &Value, sent: &[HttpRequest]) {
    let Some(expected) = case.get("expected_request") else {
        assert!(sent.is_empty(), "{name}: no request expected");
        return;
    };
    assert_eq!(sent.len(), 1, "{name}: exactly one request");
    let req = &sent[0];
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");
    if let Some(body) = expected.get("body") {
        let sent_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(&sent_body, body, "{name}: body");
    }
}

fn check_error(name: &str, expected: &Value, err: &GravError) {
    let message = expected["message"].as_str().unwrap();
    match expected["kind"].as_str().unwrap() {
        "Auth" => assert!(err.is_auth_error(), "{name}: expected Auth, got {err:?}"),
        "General" => assert!(err.is_general_error(), "{name}: expected General, got {err:?}"),
        "Config" => assert!(err.is_config_error(), "{name}: expected Config, got {err:?}"),
        other => panic!("{name}: unknown error kind: {other}"),
    }
    assert_eq!(err.message(), message, "{name}: message");
}

fn parse_state(s: &str) -> SessionState {
    match s {
        "Anonymous" => SessionState::Anonymous,
        "Authenticated" => SessionState::Authenticated,
        "Error" => SessionState::Error,
        other => panic!("unknown state: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let username = case["input"]["username"].as_str().unwrap();
        let password = case["input"]["password"].as_str().unwrap();

        let ((result, state), sent) = run_case(case, |client| {
            let result = client.login(username, password);
            (result, client.state())
        });
        check_request(name, case, &sent);

        match case.get("expected_error") {
            Some(expected) => check_error(name, expected, &result.unwrap_err()),
            None => assert!(result.is_ok(), "{name}: expected success, got {result:?}"),
        }
        let expected_state = parse_state(case["expected_state"].as_str().unwrap());
        assert_eq!(state, expected_state, "{name}: session state");
    }
}

// ---------------------------------------------------------------------------
// Session check
// ---------------------------------------------------------------------------

#[test]
fn session_check_test_vectors() {
    let raw = include_str!("../../test-vectors/session_check.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();

        let (result, sent) = run_case(case, |client| client.login_session_check());
        check_request(name, case, &sent);

        match case.get("expected_error") {
            Some(expected) => check_error(name, expected, &result.unwrap_err()),
            None => {
                let user = result.unwrap();
                let got = user.map(|u| Value::Object(u.into_inner())).unwrap_or(Value::Null);
                assert_eq!(got, case["expected_result"], "{name}: parsed result");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn clients_test_vectors() {
    let raw = include_str!("../../test-vectors/clients.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["input"];
        let query = ClientQuery::new()
            .client_id(input["client_id"].as_u64().unwrap() as u32)
            .fields(strings(&input["fields"]))
            .order(strings(&input["order"]))
            .limit(input["limit"].as_u64().unwrap() as u32);
        let verb = input["method"].as_u64().unwrap() as u8;

        let (result, sent) = run_case(case, |client| {
            CrudMethod::try_from(verb).and_then(|method| client.clients(method, &query))
        });
        check_request(name, case, &sent);

        match case.get("expected_error") {
            Some(expected) => check_error(name, expected, &result.unwrap_err()),
            None => {
                let rows: Vec<Value> = result
                    .unwrap()
                    .into_iter()
                    .map(|r| Value::Object(r.into_inner()))
                    .collect();
                assert_eq!(Value::Array(rows), case["expected_result"], "{name}: parsed result");
            }
        }
    }
}
