//! `/api` lifecycle analytics handlers.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::api::{ApiResult, AppState};
use crate::lifecycle::io::Export;
use crate::error::SbError;
use crate::lifecycle::models::forecast::MAX_FORECAST_MONTHS;
use crate::lifecycle::models::{ChurnPrediction, ClvEstimate, LeadProfile, LeadScore, RevenueForecast};
use crate::lifecycle::{
    self, AtRiskCustomer, ConversionReport, CustomerJourney, ExportFormat, Health,
    HighRiskCustomer, ImportReport, LifecycleAnalytics, PipelineForecast, PipelineHealth,
    RevenueMetrics, TrainingReport,
};
use crate::model::{Customer, LifecycleStage};
use crate::sprint::Message;

const DEFAULT_FORECAST_MONTHS: u32 = 12;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/customers", get(list_customers))
        .route("/customers/{id}", get(get_customer))
        .route("/customers/{id}/journey", get(journey))
        .route("/customers/{id}/stage", put(update_stage))
        .route("/analytics/lifecycle", get(lifecycle_analytics))
        .route("/analytics/conversion-rates", get(conversion_rates))
        .route("/analytics/revenue-metrics", get(revenue_metrics))
        .route("/analytics/high-risk-customers", get(high_risk_customers))
        .route("/ai/churn-prediction/{id}", get(churn_prediction))
        .route("/ai/churn-risk-customers", get(churn_risk_customers))
        .route("/ai/lead-score", post(lead_score))
        .route("/ai/revenue-forecast", get(revenue_forecast))
        .route("/ai/clv/{id}", get(clv))
        .route("/ai/train", post(train))
        .route("/pipeline/health", get(pipeline_health))
        .route("/pipeline/forecast", get(pipeline_forecast))
        .route("/events/customer-activity", post(customer_activity))
        .route("/data/import", post(import_data))
        .route("/data/export", get(export_data))
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(lifecycle::health(&state.models.read(), Utc::now()))
}

#[derive(Debug, Deserialize)]
struct CustomerListParams {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    stage: Option<String>,
}

const fn default_limit() -> u32 {
    100
}

async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<CustomerListParams>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state
        .blocking(move |_, db| {
            let stage = params
                .stage
                .as_deref()
                .map(str::parse::<LifecycleStage>)
                .transpose()?;
            lifecycle::list_customers(db, params.skip, params.limit, stage)
        })
        .await?;
    Ok(Json(customers))
}

async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.blocking(move |_, db| lifecycle::get_customer(db, id)).await?))
}

async fn journey(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CustomerJourney>> {
    Ok(Json(state.blocking(move |_, db| lifecycle::customer_journey(db, id)).await?))
}

#[derive(Debug, Deserialize)]
struct StageParams {
    new_stage: String,
}

async fn update_stage(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<StageParams>,
) -> ApiResult<Json<Message>> {
    let message = state
        .blocking(move |_, db| {
            let stage: LifecycleStage = params.new_stage.parse()?;
            lifecycle::update_stage(db, id, stage, Utc::now())
        })
        .await?;
    Ok(Json(message))
}

async fn lifecycle_analytics(State(state): State<AppState>) -> ApiResult<Json<LifecycleAnalytics>> {
    Ok(Json(state.blocking(|_, db| lifecycle::lifecycle_analytics(db)).await?))
}

async fn conversion_rates(State(state): State<AppState>) -> ApiResult<Json<ConversionReport>> {
    Ok(Json(state.blocking(|_, db| lifecycle::conversion_rates(db)).await?))
}

#[derive(Debug, Default, Deserialize)]
struct RevenueParams {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

async fn revenue_metrics(
    State(state): State<AppState>,
    Query(params): Query<RevenueParams>,
) -> ApiResult<Json<RevenueMetrics>> {
    let metrics = state
        .blocking(move |_, db| lifecycle::revenue_metrics(db, params.start_date, params.end_date))
        .await?;
    Ok(Json(metrics))
}

async fn high_risk_customers(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<HighRiskCustomer>>> {
    let rows = state
        .blocking(|_, db| lifecycle::high_risk_customers(db, Utc::now()))
        .await?;
    Ok(Json(rows))
}

async fn churn_prediction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ChurnPrediction>> {
    let prediction = state
        .blocking(move |state, db| {
            let customer = db.require_customer(id)?;
            Ok(state.models.read().churn.predict(&customer))
        })
        .await?;
    Ok(Json(prediction))
}

#[derive(Debug, Default, Deserialize)]
struct RiskParams {
    risk_threshold: Option<f64>,
}

async fn churn_risk_customers(
    State(state): State<AppState>,
    Query(params): Query<RiskParams>,
) -> ApiResult<Json<AtRiskCustomer>> {
    let report = state
        .blocking(move |state, db| {
            let threshold = params
                .risk_threshold
                .unwrap_or(state.config.analytics.churn_risk_threshold);
            lifecycle::churn_risk_customers(db, &state.models.read(), threshold)
        })
        .await?;
    Ok(Json(report))
}

async fn lead_score(
    State(state): State<AppState>,
    Json(lead): Json<LeadProfile>,
) -> Json<LeadScore> {
    Json(state.models.read().lead_scorer.evaluate(&lead))
}

#[derive(Debug, Default, Deserialize)]
struct ForecastParams {
    months_ahead: Option<u32>,
}

async fn revenue_forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastParams>,
) -> ApiResult<Json<RevenueForecast>> {
    let months = params.months_ahead.unwrap_or(DEFAULT_FORECAST_MONTHS);
    if !(1..=MAX_FORECAST_MONTHS).contains(&months) {
        return Err(SbError::ValidationFailed(format!(
            "months_ahead must be between 1 and {MAX_FORECAST_MONTHS}"
        ))
        .into());
    }
    Ok(Json(state.models.read().forecaster.forecast(months, Utc::now())))
}

async fn clv(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ClvEstimate>> {
    let estimate = state
        .blocking(move |state, db| {
            let customer = db.require_customer(id)?;
            Ok(state.models.read().clv.calculate(&customer))
        })
        .await?;
    Ok(Json(estimate))
}

async fn train(State(state): State<AppState>) -> ApiResult<Json<TrainingReport>> {
    let report = state
        .blocking(|state, db| {
            lifecycle::train_models(db, &state.models, &state.config.analytics)
        })
        .await?;
    Ok(Json(report))
}

async fn pipeline_health(State(state): State<AppState>) -> ApiResult<Json<PipelineHealth>> {
    Ok(Json(state.blocking(|_, db| lifecycle::pipeline_health(db)).await?))
}

async fn pipeline_forecast(State(state): State<AppState>) -> ApiResult<Json<PipelineForecast>> {
    let forecast = state
        .blocking(|_, db| lifecycle::pipeline_forecast(db, Utc::now()))
        .await?;
    Ok(Json(forecast))
}

#[derive(Debug, Deserialize)]
struct ActivityEvent {
    customer_id: i64,
    activity_type: String,
    #[serde(default)]
    activity_data: Value,
}

async fn customer_activity(
    State(state): State<AppState>,
    Json(event): Json<ActivityEvent>,
) -> ApiResult<Json<Message>> {
    let message = state
        .blocking(move |state, db| {
            lifecycle::record_activity(
                db,
                &state.models.read(),
                event.customer_id,
                &event.activity_type,
                &event.activity_data,
                Utc::now(),
            )
        })
        .await?;
    Ok(Json(message))
}

/// Import a JSON array of customers, then retrain.
async fn import_data(
    State(state): State<AppState>,
    Json(records): Json<Vec<Value>>,
) -> ApiResult<Json<ImportReport>> {
    let report = state
        .blocking(move |state, db| {
            let report = lifecycle::import_customers(db, records, Utc::now())?;
            lifecycle::train_models(db, &state.models, &state.config.analytics)?;
            Ok(report)
        })
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
struct ExportParams {
    format: Option<String>,
}

async fn export_data(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let export = state
        .blocking(move |_, db| {
            let format = params
                .format
                .as_deref()
                .map_or(Ok(ExportFormat::default()), str::parse)?;
            lifecycle::export_customers(db, format, Utc::now())
        })
        .await?;
    Ok(match export {
        Export::Csv(body) => ([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response(),
        Export::Json(body) => Json(body).into_response(),
    })
}
