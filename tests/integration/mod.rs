//! Integration tests for the market admin client.
//!
//! These tests run the real HTTP client against an in-process stub of the
//! admin API bound to an ephemeral local port.
//! Run with: cargo test --test integration

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use market_admin::config::Config;
use market_admin::market::auth::{NoToken, StaticToken, StoredToken, TokenProvider, TOKEN_KEY};
use market_admin::market::{AdminClient, MarketApi, TokenStore};
use market_admin::views::{MarketForm, MarketListView, Notice, ResultDeclarationView};

/// One request as the stub backend saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    auth: Option<String>,
    body: Option<Value>,
}

#[derive(Clone, Default)]
struct Backend {
    markets: Arc<Mutex<Vec<Value>>>,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn with_markets(markets: Vec<Value>) -> Self {
        let backend = Self::default();
        *backend.markets.lock().unwrap() = markets;
        backend
    }

    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Option<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push(Seen {
            method,
            path,
            auth,
            body,
        });
    }

    fn mutations(&self) -> Vec<Seen> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.method != "GET")
            .cloned()
            .collect()
    }

    fn all(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }
}

type Reply = (StatusCode, Json<Value>);

async fn list(State(b): State<Backend>, headers: HeaderMap) -> Reply {
    b.record("GET", "/api/markets".to_string(), &headers, None);
    let markets = b.markets.lock().unwrap().clone();
    (StatusCode::OK, Json(Value::Array(markets)))
}

async fn add(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    b.record("POST", "/api/admin/add-market".to_string(), &headers, Some(body.clone()));

    let mut markets = b.markets.lock().unwrap();
    let mut market = body;
    market["_id"] = json!(format!("oid-{}", markets.len() + 1));
    markets.push(market.clone());

    (
        StatusCode::CREATED,
        Json(json!({"message": "Market added", "market": market})),
    )
}

async fn update(
    State(b): State<Backend>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    b.record("PUT", format!("/api/admin/markets/{}", id), &headers, Some(body.clone()));

    if id == "LOCKED" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "Admin access required"})),
        );
    }

    let mut markets = b.markets.lock().unwrap();
    match markets.iter_mut().find(|m| m["marketId"] == json!(id)) {
        Some(market) => {
            market["isBettingOpen"] = body["isBettingOpen"].clone();
            market["openBetting"] = body["isBettingOpen"].clone();
            (StatusCode::OK, Json(market.clone()))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Market not found"})),
        ),
    }
}

async fn remove(State(b): State<Backend>, Path(id): Path<String>, headers: HeaderMap) -> Reply {
    b.record("DELETE", format!("/api/admin/markets/{}", id), &headers, None);

    let mut markets = b.markets.lock().unwrap();
    let before = markets.len();
    markets.retain(|m| m["_id"] != json!(id));
    if markets.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Market not found"})),
        );
    }
    (StatusCode::OK, Json(json!({"message": "Market deleted"})))
}

async fn declare(State(b): State<Backend>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    b.record(
        "POST",
        "/api/admin/markets/declare-results".to_string(),
        &headers,
        Some(body),
    );
    (StatusCode::OK, Json(json!({"message": "Results declared"})))
}

/// Start the stub backend and return its API base URL.
async fn spawn_backend(backend: Backend) -> String {
    let app = Router::new()
        .route("/api/markets", get(list))
        .route("/api/admin/add-market", post(add))
        .route("/api/admin/markets/declare-results", post(declare))
        .route("/api/admin/markets/:id", put(update).delete(remove))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

fn client(base_url: &str, auth: Arc<dyn TokenProvider>) -> AdminClient {
    let config = Config {
        admin_api_url: base_url.to_string(),
        ..Config::default()
    };
    AdminClient::new(&config, auth).unwrap()
}

fn seeded() -> Backend {
    Backend::with_markets(vec![
        json!({
            "_id": "oid-1",
            "marketId": "M1",
            "name": "Morning",
            "openTime": "10:00 AM",
            "closeTime": "12:00 PM",
            "isBettingOpen": false,
            "results": {"jodiResult": "45"}
        }),
        json!({
            "_id": "oid-2",
            "marketId": "M2",
            "name": "Evening",
            "openTime": "6:00 PM",
            "closeTime": "8:00 PM",
            "isBettingOpen": true
        }),
    ])
}

#[tokio::test]
async fn list_markets_parses_documents_and_sends_bearer() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base, Arc::new(StaticToken::new("t0k")));

    let markets = api.list_markets().await.unwrap();

    assert_eq!(markets.len(), 2);
    assert_eq!(markets[0].id.as_deref(), Some("oid-1"));
    assert_eq!(markets[0].results.get("jodiResult"), Some("45"));
    assert!(markets[1].is_betting_open);
    assert_eq!(backend.all()[0].auth.as_deref(), Some("Bearer t0k"));
}

#[tokio::test]
async fn missing_token_sends_no_authorization_header() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base, Arc::new(NoToken));

    api.list_markets().await.unwrap();

    assert_eq!(backend.all()[0].auth, None);
}

#[tokio::test]
async fn stored_token_is_read_per_request() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(dir.path().join("store.json"));
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base, Arc::new(StoredToken::new(store.clone())));

    api.list_markets().await.unwrap();
    store.set(TOKEN_KEY, "fresh").unwrap();
    api.list_markets().await.unwrap();

    let seen = backend.all();
    assert_eq!(seen[0].auth, None);
    assert_eq!(seen[1].auth.as_deref(), Some("Bearer fresh"));
}

#[tokio::test]
async fn toggle_puts_negated_flag_then_flips_locally() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let mut view = MarketListView::new(client(&base, Arc::new(StaticToken::new("t0k"))));
    view.mount().await.unwrap();

    view.toggle_betting("M1", false).await.unwrap();

    let puts = backend.mutations();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].method, "PUT");
    assert_eq!(puts[0].path, "/api/admin/markets/M1");
    assert_eq!(puts[0].body, Some(json!({"isBettingOpen": true})));
    assert_eq!(puts[0].auth.as_deref(), Some("Bearer t0k"));
    assert!(view.find("M1").unwrap().market.is_betting_open);
}

#[tokio::test]
async fn toggle_failure_surfaces_server_message() {
    let backend = Backend::with_markets(vec![json!({"_id": "oid-9", "marketId": "LOCKED"})]);
    let base = spawn_backend(backend.clone()).await;
    let mut view = MarketListView::new(client(&base, Arc::new(NoToken)));
    view.mount().await.unwrap();

    let err = view.toggle_betting("LOCKED", false).await.unwrap_err();

    assert_eq!(err.notice_message(), "Admin access required");
    assert_eq!(
        view.notice(),
        Some(&Notice::Error(
            "Failed to toggle market: Admin access required".to_string()
        ))
    );
    assert!(!view.find("LOCKED").unwrap().market.is_betting_open);
}

#[tokio::test]
async fn form_submit_normalizes_and_refetches() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let mut view = MarketListView::new(client(&base, Arc::new(StaticToken::new("t0k"))));
    view.mount().await.unwrap();

    let mut form = MarketForm::open();
    form.name = "Night".to_string();
    form.open_time = "14:05".to_string();
    form.close_time = "00:30".to_string();
    form.is_betting_open = true;

    let created = form.submit(&mut view).await.unwrap();

    assert!(!form.is_open());
    assert_eq!(created.id.as_deref(), Some("oid-3"));

    let posted = backend.mutations()[0].body.clone().unwrap();
    assert_eq!(posted["openTime"], json!("2:05 PM"));
    assert_eq!(posted["closeTime"], json!("12:30 AM"));
    assert_eq!(posted["isBettingOpen"], json!(true));
    assert_eq!(posted["marketId"], json!(created.market_id));

    assert_eq!(view.rows().len(), 3);
    let row = view.find(&created.market_id).unwrap();
    assert_eq!(row.id, "oid-3");
}

#[tokio::test]
async fn delete_sends_view_id_and_drops_row() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let mut view = MarketListView::new(client(&base, Arc::new(StaticToken::new("t0k"))));
    view.mount().await.unwrap();

    assert!(view.delete_market("oid-1", |_| true).await.unwrap());

    let deletes = backend.mutations();
    assert_eq!(deletes[0].method, "DELETE");
    assert_eq!(deletes[0].path, "/api/admin/markets/oid-1");
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.rows()[0].id, "oid-2");
}

#[tokio::test]
async fn delete_rejected_by_server_keeps_row() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let mut view = MarketListView::new(client(&base, Arc::new(NoToken)));
    view.mount().await.unwrap();

    // Remove it server-side first so the DELETE 404s.
    backend.markets.lock().unwrap().retain(|m| m["_id"] != json!("oid-2"));

    assert!(view.delete_market("oid-2", |_| true).await.is_err());
    assert_eq!(view.rows().len(), 2);
    assert_eq!(view.rows()[1].id, "oid-2");
}

#[tokio::test]
async fn declare_posts_selected_market_and_inputs() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let mut view = ResultDeclarationView::new(client(&base, Arc::new(StaticToken::new("t0k"))));
    view.mount().await.unwrap();

    view.select("M2").unwrap();
    view.set_results("45", "67");
    view.submit().await.unwrap();

    let posts = backend.mutations();
    assert_eq!(posts[0].path, "/api/admin/markets/declare-results");
    assert_eq!(
        posts[0].body,
        Some(json!({"marketId": "M2", "openResult": "45", "closeResult": "67"}))
    );
    assert!(matches!(view.notice(), Some(Notice::Success(_))));
}

#[tokio::test]
async fn unreachable_backend_fails_mount() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut view = MarketListView::new(client(&format!("http://{}/api", addr), Arc::new(NoToken)));

    assert!(view.mount().await.is_err());
    assert!(matches!(
        view.state(),
        market_admin::views::LoadState::Failed { .. }
    ));
}
