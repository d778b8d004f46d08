//! In-memory Gravitas API server for exercising the SDK.
//!
//! Serves `login` (GET/POST/DELETE), `clients` and `clients/{id}` with the
//! same `{success, error?, rows?}` envelope the real server uses. Sessions
//! are tracked through a cookie. Like the real API, `fields`, `order` and
//! `limit` on client reads are accepted and ignored.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "gravsession";

#[derive(Clone, Debug)]
pub struct User {
    pub username: String,
    pub password: String,
    pub user_id: i64,
    pub root: bool,
    pub last_account: i64,
    pub pwd_expire: String,
    pub force_pwd_change: bool,
    pub expired_pwd: bool,
}

impl User {
    fn new(username: &str, password: &str, user_id: i64) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            user_id,
            root: false,
            last_account: 1,
            pwd_expire: "2099-12-31".to_string(),
            force_pwd_change: false,
            expired_pwd: false,
        }
    }

    /// The row shape returned by `login`.
    pub fn row(&self) -> Value {
        json!({
            "FORCE_PWD_CHANGE": self.force_pwd_change,
            "LAST_ACCT": self.last_account,
            "NEXT_PWNED": null,
            "PWD_EXPIRE": self.pwd_expire,
            "ROOT": self.root,
            "USER": self.username,
            "USER_ID": self.user_id,
            "expired_pwd": self.expired_pwd,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    #[serde(rename = "CLIENT_ID")]
    pub id: u32,
    #[serde(rename = "NAME")]
    pub name: String,
    #[serde(rename = "ACTIVE")]
    pub active: bool,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "USER")]
    pub user: String,
    #[serde(rename = "PASSWORD")]
    pub password: String,
}

/// Users and clients the server starts with.
#[derive(Clone, Debug)]
pub struct Fixtures {
    pub users: Vec<User>,
    pub clients: Vec<Client>,
}

impl Default for Fixtures {
    /// - `restuser` / `gravitas1234567890`: a normal administrator
    /// - `newuser` / `changeme`: must change password
    /// - `olduser` / `expired`: password expired
    fn default() -> Self {
        let mut restuser = User::new("restuser", "gravitas1234567890", 2);
        restuser.root = true;
        let mut newuser = User::new("newuser", "changeme", 3);
        newuser.force_pwd_change = true;
        let mut olduser = User::new("olduser", "expired", 4);
        olduser.expired_pwd = true;
        olduser.pwd_expire = "2020-10-23".to_string();

        let client = |id: u32, name: &str| Client {
            id,
            name: name.to_string(),
            active: true,
        };

        Self {
            users: vec![restuser, newuser, olduser],
            clients: vec![client(100, "Acme Corp"), client(101, "Globex"), client(205, "Initech")],
        }
    }
}

pub struct AppState {
    users: HashMap<String, User>,
    clients: Vec<Client>,
    sessions: RwLock<HashMap<Uuid, String>>,
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    app_with(Fixtures::default())
}

pub fn app_with(fixtures: Fixtures) -> Router {
    let db: Db = Arc::new(AppState {
        users: fixtures
            .users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect(),
        clients: fixtures.clients,
        sessions: RwLock::new(HashMap::new()),
    });
    Router::new()
        .route("/login", get(session_check).post(login).delete(logout))
        .route("/clients", get(list_clients))
        .route("/clients/{id}", get(get_client))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn rows(rows: Vec<Value>) -> Json<Value> {
    Json(json!({ "success": true, "rows": rows }))
}

fn failure(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "success": false, "error": error }))).into_response()
}

fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

async fn current_user(db: &AppState, headers: &HeaderMap) -> Option<User> {
    let id = session_id(headers)?;
    let sessions = db.sessions.read().await;
    let username = sessions.get(&id)?;
    db.users.get(username).cloned()
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Response {
    let Some(user) = db
        .users
        .get(&input.user)
        .filter(|u| u.password == input.password)
    else {
        tracing::info!(user = %input.user, "rejected login");
        return failure(StatusCode::UNAUTHORIZED, "Invalid username or password");
    };

    let token = Uuid::new_v4();
    db.sessions.write().await.insert(token, user.username.clone());
    tracing::info!(user = %user.username, "login");

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly");
    ([(header::SET_COOKIE, cookie)], rows(vec![user.row()])).into_response()
}

async fn session_check(State(db): State<Db>, headers: HeaderMap) -> Json<Value> {
    match current_user(&db, &headers).await {
        Some(user) => rows(vec![user.row()]),
        None => rows(Vec::new()),
    }
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Response {
    let removed = match session_id(&headers) {
        Some(id) => db.sessions.write().await.remove(&id).is_some(),
        None => false,
    };
    if !removed {
        return failure(StatusCode::UNAUTHORIZED, "Not logged in");
    }
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response()
}

async fn list_clients(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if current_user(&db, &headers).await.is_none() {
        return failure(StatusCode::UNAUTHORIZED, "Not logged in");
    }
    tracing::debug!(?params, "listing clients, filters ignored");
    let all = db
        .clients
        .iter()
        .filter_map(|c| serde_json::to_value(c).ok())
        .collect();
    rows(all).into_response()
}

async fn get_client(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u32>) -> Response {
    if current_user(&db, &headers).await.is_none() {
        return failure(StatusCode::UNAUTHORIZED, "Not logged in");
    }
    let found = db
        .clients
        .iter()
        .filter(|c| c.id == id)
        .filter_map(|c| serde_json::to_value(c).ok())
        .collect();
    rows(found).into_response()
}
