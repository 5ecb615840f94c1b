use std::time::{Duration, Instant};

use serde_json::{Value, json};
use sprintboard::error::SbError;
use sprintboard::storage::Database;
use sprintboard::test_utils::ScriptedChatClient;

use crate::fixture::{self, create_deal};

#[tokio::test]
async fn test_create_and_list_persons() {
    let server = fixture::server();

    let response = server
        .post("/api/sprint/persons")
        .json(&json!({
            "name": "Mai Tran",
            "email": "mai@example.com",
            "role": "head_of_engineering",
            "skills": ["rust", "sql"],
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let person: Value = response.json();
    assert_eq!(person["role"], "head_of_engineering");
    assert_eq!(person["availability"], 1.0);

    let persons: Value = server.get("/api/sprint/persons").await.json();
    let persons = persons.as_array().unwrap();
    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0]["email"], "mai@example.com");
}

#[tokio::test]
async fn test_board_has_six_columns_in_order() {
    let server = fixture::server();
    create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    create_deal(&server, "Data platform", "qualified_cso", 120_000.0).await;

    let response = server.get("/api/sprint/board").await;
    assert_eq!(response.status_code(), 200);
    let board: Value = response.json();

    let statuses: Vec<&str> = board["columns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| column["status"].as_str().unwrap())
        .collect();
    assert_eq!(
        statuses,
        [
            "lead",
            "qualified_solution",
            "qualified_delivery",
            "qualified_cso",
            "deal",
            "project"
        ]
    );
    assert_eq!(board["total_deals"], 2);
    assert_eq!(board["total_value"], 170_000.0);
    assert_eq!(board["columns"][0]["count"], 1);
    assert_eq!(board["columns"][0]["deals"][0]["title"], "ERP rollout");
}

#[tokio::test]
async fn test_move_deal_updates_status() {
    let server = fixture::server();
    let deal = create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/sprint/deals/{id}/status"))
        .json(&json!({"new_status": "qualified_solution", "change_reason": "budget confirmed"}))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let body: Value = response.json();
    assert_eq!(body["message"], "Deal status updated successfully");
    assert_eq!(body["deal"]["status"], "qualified_solution");

    let detail: Value = server
        .get(&format!("/api/sprint/deals/{id}/detailed"))
        .await
        .json();
    let history = detail["status_history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["previous_status"], "lead");
    assert_eq!(history[0]["change_reason"], "budget confirmed");
    assert_eq!(detail["ai_insights"].as_array().unwrap().len(), 1);
    assert_eq!(detail["ai_insights"][0]["insight_type"], "qualified_solution_analysis");
}

#[tokio::test]
async fn test_move_deal_rejects_unknown_status() {
    let server = fixture::server();
    let deal = create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/sprint/deals/{id}/status"))
        .json(&json!({"new_status": "won"}))
        .await;
    let body = assert_api_error!(response, 400, "INVALID_STATUS");
    assert!(body["detail"].as_str().unwrap().contains("qualified_solution"));

    let unchanged: Value = server.get(&format!("/api/sprint/deals/{id}")).await.json();
    assert_eq!(unchanged["status"], "lead");
}

#[tokio::test]
async fn test_missing_deal_is_not_found() {
    let server = fixture::server();

    let response = server.get("/api/sprint/deals/999").await;
    let body = assert_api_error!(response, 404, "NOT_FOUND");
    insta::assert_json_snapshot!(body, @r#"
    {
      "code": "NOT_FOUND",
      "detail": "Deal not found",
      "status": 404
    }
    "#);

    let response = server
        .put("/api/sprint/deals/999/status")
        .json(&json!({"new_status": "deal"}))
        .await;
    assert_api_error!(response, 404, "NOT_FOUND");
}

#[tokio::test]
async fn test_create_deal_requires_title() {
    let server = fixture::server();

    let response = server
        .post("/api/sprint/deals")
        .json(&json!({"title": "  ", "status": "lead"}))
        .await;
    assert_api_error!(response, 400, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_comments_round_trip_through_detail() {
    let server = fixture::server();
    let deal = create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let response = server
        .post(&format!("/api/sprint/deals/{id}/comments"))
        .json(&json!({
            "commenter_name": "Linh",
            "commenter_role": "sales",
            "comment_text": "Customer asked for a pilot",
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let comment: Value = response.json();
    let comment_id = comment["id"].as_i64().unwrap();

    let detail: Value = server
        .get(&format!("/api/sprint/deals/{id}/detailed"))
        .await
        .json();
    assert_eq!(detail["comments"][0]["comment_text"], "Customer asked for a pilot");
    assert_eq!(detail["timeline"].as_array().unwrap().last().unwrap()["type"], "created");

    let response = server
        .delete(&format!("/api/sprint/comments/{comment_id}"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.json::<Value>()["message"],
        "Comment deleted successfully"
    );

    let response = server
        .delete(&format!("/api/sprint/comments/{comment_id}"))
        .await;
    assert_api_error!(response, 404, "NOT_FOUND");
}

#[tokio::test]
async fn test_offline_insight_for_lead_is_qualification() {
    let server = fixture::server();
    let deal = create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let response = server.post(&format!("/api/sprint/ai/insight/{id}")).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let insight: Value = response.json();
    assert_eq!(insight["deal_id"], id);
    assert_eq!(insight["confidence"], 70.0);
    let score = insight["qualification_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert!(!insight["next_steps"].as_array().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_board_stays_responsive_during_slow_insight() {
    let client = ScriptedChatClient::delayed(
        [Err(SbError::Llm("upstream timeout".into()))],
        Duration::from_millis(1_500),
    );
    let server = fixture::server_with_agents(Database::open_in_memory().unwrap(), client.agents(true));
    let deal = create_deal(&server, "Data platform", "lead", 80_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let insight = async { server.post(&format!("/api/sprint/ai/insight/{id}")).await };
    let board = async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let started = Instant::now();
        let response = server.get("/api/sprint/board").await;
        (response, started.elapsed())
    };
    let (insight, (board, elapsed)) = tokio::join!(insight, board);

    assert_eq!(board.status_code(), 200, "{}", board.text());
    assert!(elapsed < Duration::from_millis(1_000), "board took {elapsed:?}");
    assert_eq!(insight.status_code(), 200, "{}", insight.text());
    let insight: Value = insight.json();
    assert_eq!(insight["confidence"], 70.0);
    assert_eq!(client.prompts().len(), 1);
}

#[tokio::test]
async fn test_insight_for_closed_column_is_unavailable() {
    let server = fixture::server();
    let deal = create_deal(&server, "Support renewal", "project", 10_000.0).await;
    let id = deal["id"].as_i64().unwrap();

    let insight: Value = server
        .get(&format!("/api/sprint/ai/insight/{id}"))
        .await
        .json();
    assert_eq!(insight["message"], "No AI insights available for status: project");
}

#[tokio::test]
async fn test_contacts_crud_and_stats() {
    let server = fixture::server();

    let response = server
        .post("/api/sprint/contacts")
        .json(&json!({
            "full_name": "Nguyen Van A",
            "company_name": "Globex",
            "email": "a@globex.example",
            "status": "prospect",
            "estimated_revenue": 40_000.0,
            "gmv": 100_000.0,
        }))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let contact: Value = response.json();
    let id = contact["id"].as_i64().unwrap();

    let found: Value = server
        .get("/api/sprint/contacts")
        .add_query_param("search", "GLOBEX")
        .await
        .json();
    assert_eq!(found.as_array().unwrap().len(), 1);

    let response = server
        .put(&format!("/api/sprint/contacts/{id}"))
        .json(&json!({"status": "customer"}))
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    assert_eq!(response.json::<Value>()["status"], "customer");

    let stats: Value = server.get("/api/sprint/contacts/stats/summary").await.json();
    assert_eq!(stats["total_contacts"], 1);
    assert_eq!(stats["status_distribution"]["customer"], 1);
    assert_eq!(stats["status_distribution"]["lead"], 0);
    assert_eq!(stats["total_estimated_revenue"], 40_000.0);

    let response = server.delete(&format!("/api/sprint/contacts/{id}")).await;
    assert_eq!(response.status_code(), 200);
    let response = server.get(&format!("/api/sprint/contacts/{id}")).await;
    assert_api_error!(response, 404, "NOT_FOUND");
}

#[tokio::test]
async fn test_dashboard_counts_deals_per_status() {
    let server = fixture::server();
    create_deal(&server, "ERP rollout", "lead", 50_000.0).await;
    create_deal(&server, "Data platform", "lead", 30_000.0).await;

    let dashboard: Value = server.get("/api/sprint/dashboard").await.json();
    let metrics = &dashboard["metrics"];
    assert_eq!(metrics["total_deals"], 2);
    assert_eq!(metrics["total_pipeline_value"], 80_000.0);
    assert_eq!(metrics["average_deal_size"], 40_000.0);
    assert_eq!(metrics["deals_by_status"]["lead"], 2);
    assert_eq!(metrics["deals_by_status"]["project"], 0);
}

#[tokio::test]
async fn test_seeded_board_and_customer_success() {
    let server = fixture::seeded_server();

    let board: Value = server.get("/api/sprint/board").await.json();
    assert_eq!(board["total_deals"], 12);
    for column in board["columns"].as_array().unwrap() {
        assert_eq!(column["count"], 2, "{}", column["status"]);
    }

    let rows: Value = server
        .get("/api/sprint/customer-success/customers")
        .await
        .json();
    assert_eq!(rows.as_array().unwrap().len(), 4);

    let response = server.get("/api/sprint/customer-success/summary").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = fixture::server();

    let response = server.get("/api/sprint/persons").await;
    let request_id = response.header("x-request-id");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}
