use serde_json::{Value, json};

use crate::fixture;

fn sample_customers() -> Value {
    json!([
        {
            "first_name": "An",
            "last_name": "Le",
            "email": "an@example.com",
            "industry": "Technology",
            "company_size": "50-150",
            "mql": true,
            "sql": true,
            "is_customer": true,
            "acv": 24000.0,
        },
        {
            "first_name": "Binh",
            "email": "binh@example.com",
            "mql": true,
        },
        {
            "first_name": "Chi",
            "email": "chi@example.com",
            "mql": true,
            "sql": true,
            "is_customer": true,
            "churned": true,
        },
    ])
}

#[tokio::test]
async fn test_health_reports_model_status() {
    let server = fixture::server();

    let response = server.get("/api/health").await;
    assert_eq!(response.status_code(), 200);
    let health: Value = response.json();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], sprintboard::VERSION);
    assert_eq!(health["models_status"]["churn_predictor"], false);
}

#[tokio::test]
async fn test_import_then_filter_by_stage() {
    let server = fixture::server();

    let response = server.post("/api/data/import").json(&sample_customers()).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let report: Value = response.json();
    assert_eq!(report["imported"], 3);
    assert_eq!(report["message"], "Successfully imported 3 customers");

    let again: Value = server
        .post("/api/data/import")
        .json(&sample_customers())
        .await
        .json();
    assert_eq!(again["imported"], 0);
    assert_eq!(again["skipped"], 3);

    let customers: Value = server
        .get("/api/customers")
        .add_query_param("stage", "customer")
        .await
        .json();
    let customers = customers.as_array().unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0]["email"], "an@example.com");
    assert_eq!(customers[0]["company_size"], 100.0);

    let response = server
        .get("/api/customers")
        .add_query_param("stage", "prospect")
        .await;
    assert_api_error!(response, 400, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_import_collects_bad_records() {
    let server = fixture::server();

    let report: Value = server
        .post("/api/data/import")
        .json(&json!([{"email": "ok@example.com"}, {"first_name": "No Email"}, 7]))
        .await
        .json();
    assert_eq!(report["total_processed"], 3);
    assert_eq!(report["imported"], 1);
    assert_eq!(report["errors"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_export_csv_and_unknown_format() {
    let server = fixture::server();
    server.post("/api/data/import").json(&sample_customers()).await;

    let response = server
        .get("/api/data/export")
        .add_query_param("format", "csv")
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(
        response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let body = response.text();
    let mut lines = body.lines();
    assert_eq!(lines.next(), Some("id,name,email,stage,revenue,churn_risk"));
    assert_eq!(lines.count(), 3);
    assert!(body.contains("an@example.com,Customer,24000,No"));

    let export: Value = server
        .get("/api/data/export")
        .add_query_param("format", "json")
        .await
        .json();
    assert_eq!(export["customers"].as_array().unwrap().len(), 3);

    let response = server
        .get("/api/data/export")
        .add_query_param("format", "xml")
        .await;
    assert_api_error!(response, 400, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_stage_update_and_journey() {
    let server = fixture::server();
    server.post("/api/data/import").json(&sample_customers()).await;
    let customers: Value = server
        .get("/api/customers")
        .add_query_param("stage", "mql")
        .await
        .json();
    let id = customers[0]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/customers/{id}/stage"))
        .add_query_param("new_stage", "customer")
        .await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    assert_eq!(
        response.json::<Value>()["message"],
        "Customer stage updated successfully"
    );

    let customer: Value = server.get(&format!("/api/customers/{id}")).await.json();
    assert_eq!(customer["sql"], true);
    assert_eq!(customer["is_customer"], true);

    let response = server.get(&format!("/api/customers/{id}/journey")).await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let response = server
        .put("/api/customers/999/stage")
        .add_query_param("new_stage", "customer")
        .await;
    assert_api_error!(response, 404, "NOT_FOUND");
}

#[tokio::test]
async fn test_lead_score_untrained_is_neutral() {
    let server = fixture::server();

    let score: Value = server
        .post("/api/ai/lead-score")
        .json(&json!({
            "Company_Size": 5000,
            "Industry": "Technology",
            "Region": "North America",
            "Decision_Maker_Role": "CEO",
        }))
        .await
        .json();
    assert_eq!(score["lead_score"], 50.0);
    assert_eq!(score["recommendations"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_training_on_seeded_customers() {
    let server = fixture::seeded_server();

    let response = server.post("/api/ai/train").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());
    let report: Value = response.json();
    assert_eq!(report["message"], "Models trained successfully");
    assert_eq!(report["rows"], 48);
    assert_eq!(report["models_status"]["churn_predictor"], true);
    assert_eq!(report["models_status"]["lead_scorer"], true);

    let customers: Value = server.get("/api/customers").await.json();
    let id = customers[0]["id"].as_i64().unwrap();
    let prediction: Value = server
        .get(&format!("/api/ai/churn-prediction/{id}"))
        .await
        .json();
    let probability = prediction["churn_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&probability));

    let response = server.get("/api/ai/churn-prediction/999").await;
    assert_api_error!(response, 404, "NOT_FOUND");
}

#[tokio::test]
async fn test_untrained_revenue_forecast_is_empty() {
    let server = fixture::server();

    let forecast: Value = server
        .get("/api/ai/revenue-forecast")
        .add_query_param("months_ahead", 3)
        .await
        .json();
    assert_eq!(forecast["forecast_period"], "3 months");
    assert!(forecast["monthly_forecast"].as_array().unwrap().is_empty());
    assert_eq!(forecast["predicted_revenue"], 0.0);
}

#[tokio::test]
async fn test_revenue_forecast_rejects_out_of_range_horizon() {
    let server = fixture::seeded_server();

    for months in [0, 121, 4_000_000] {
        let response = server
            .get("/api/ai/revenue-forecast")
            .add_query_param("months_ahead", months)
            .await;
        assert_api_error!(response, 400, "VALIDATION_FAILED");
    }
}

#[tokio::test]
async fn test_revenue_forecast_horizon() {
    let server = fixture::seeded_server();
    let response = server.post("/api/ai/train").await;
    assert_eq!(response.status_code(), 200, "{}", response.text());

    let forecast: Value = server
        .get("/api/ai/revenue-forecast")
        .add_query_param("months_ahead", 3)
        .await
        .json();
    assert_eq!(forecast["monthly_forecast"].as_array().unwrap().len(), 3);
    let lower = forecast["confidence_interval_lower"].as_f64().unwrap();
    let upper = forecast["confidence_interval_upper"].as_f64().unwrap();
    let predicted = forecast["predicted_revenue"].as_f64().unwrap();
    assert!(lower <= predicted && predicted <= upper);
}

#[tokio::test]
async fn test_seeded_analytics_endpoints_respond() {
    let server = fixture::seeded_server();

    for path in [
        "/api/analytics/lifecycle",
        "/api/analytics/conversion-rates",
        "/api/analytics/revenue-metrics",
        "/api/analytics/high-risk-customers",
        "/api/ai/churn-risk-customers",
        "/api/pipeline/health",
        "/api/pipeline/forecast",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 200, "{path}: {}", response.text());
    }
}
