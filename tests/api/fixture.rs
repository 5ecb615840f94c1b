use axum_test::TestServer;
use serde_json::{Value, json};

use sprintboard::agents::Agents;
use sprintboard::api::{AppState, router};
use sprintboard::config::Config;
use sprintboard::seed::seed_demo;
use sprintboard::storage::Database;

/// Assert an error body's status and machine code; evaluates to the body.
macro_rules! assert_api_error {
    ($response:expr, $status:expr, $code:expr) => {{
        let response = $response;
        assert_eq!(response.status_code(), $status, "{}", response.text());
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], $code, "{body}");
        assert_eq!(body["status"], $status);
        body
    }};
}

/// Offline server over an empty in-memory database.
pub fn server() -> TestServer {
    server_with(Database::open_in_memory().unwrap())
}

/// Offline server over the demo dataset, models trained at startup.
pub fn seeded_server() -> TestServer {
    let db = Database::open_in_memory().unwrap();
    seed_demo(&db, 42, chrono::Utc::now()).unwrap();
    server_with(db)
}

fn server_with(db: Database) -> TestServer {
    server_with_agents(db, Agents::offline())
}

/// Server over an empty in-memory database using the given agent runner.
pub fn server_with_agents(db: Database, agents: Agents) -> TestServer {
    let state = AppState::new(db, agents, Config::default());
    state.train_models().unwrap();
    TestServer::new(router(state)).expect("Failed to create test server")
}

pub async fn create_deal(server: &TestServer, title: &str, status: &str, value: f64) -> Value {
    let response = server
        .post("/api/sprint/deals")
        .json(&json!({
            "title": title,
            "status": status,
            "estimated_value": value,
            "customer_name": "Acme Corp",
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    response.json()
}
