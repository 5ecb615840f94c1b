//! `/api/sprint` handlers.

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;

use crate::api::{ApiResult, AppState};
use crate::contacts::{self, ContactStats, DEFAULT_PAGE_SIZE};
use crate::customer_success::{
    self, CustomerDetail, CustomerQuery, CustomerRow, SortBy, SortOrder, SuccessSummary,
};
use crate::dashboard::{self, Analytics, Dashboard};
use crate::insights::{self, InsightOutcome, QualificationInsight};
use crate::model::{
    Comment, Contact, ContactPatch, ContactStatus, CustomerSatisfaction, Deal, DealPatch,
    DealStatus, NewComment, NewContact, NewDeal, NewPerson, Person,
};
use crate::sprint::{
    self, Board, DealDetail, DueReminder, Message, MoveOutcome, StatusUpdate,
};
use crate::storage::{ContactQuery, DealFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/board", get(board))
        .route("/deals", get(list_deals).post(create_deal))
        .route("/deals/{id}", get(get_deal).put(update_deal).delete(delete_deal))
        .route("/deals/{id}/detailed", get(deal_detail))
        .route("/deals/{id}/status", put(move_deal))
        .route("/deals/{id}/comments", post(add_comment))
        .route("/deals/{id}/reminder", post(mark_reminder))
        .route("/comments/{id}", delete(delete_comment))
        .route("/persons", get(list_persons).post(create_person))
        .route("/ai/insight/{deal_id}", get(insight).post(insight))
        .route("/ai/qualification/{deal_id}", post(qualification))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/analytics", get(analytics))
        .route("/contacts", get(list_contacts).post(create_contact))
        .route("/contacts/stats/summary", get(contact_stats))
        .route(
            "/contacts/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route("/customer-success/summary", get(success_summary))
        .route("/customer-success/customers", get(success_customers))
        .route(
            "/customer-success/customers/{deal_id}",
            get(success_customer).put(record_satisfaction),
        )
        .route("/reminders", get(reminders))
}

async fn board(State(state): State<AppState>) -> ApiResult<Json<Board>> {
    let board = state
        .blocking(|state, db| sprint::board(db, Utc::now(), state.config.contract))
        .await?;
    Ok(Json(board))
}

#[derive(Debug, Default, Deserialize)]
struct DealListParams {
    status: Option<String>,
    assigned_person_id: Option<i64>,
}

async fn list_deals(
    State(state): State<AppState>,
    Query(params): Query<DealListParams>,
) -> ApiResult<Json<Vec<Deal>>> {
    let deals = state
        .blocking(move |_, db| {
            let status = params.status.as_deref().map(DealStatus::parse).transpose()?;
            db.list_deals(DealFilter {
                status,
                assigned_person_id: params.assigned_person_id,
            })
        })
        .await?;
    Ok(Json(deals))
}

async fn create_deal(
    State(state): State<AppState>,
    Json(deal): Json<NewDeal>,
) -> ApiResult<Json<Deal>> {
    let deal = state
        .blocking(move |_, db| sprint::create_deal(db, &deal, Utc::now()))
        .await?;
    Ok(Json(deal))
}

async fn get_deal(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Deal>> {
    Ok(Json(state.blocking(move |_, db| db.require_deal(id)).await?))
}

async fn update_deal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<DealPatch>,
) -> ApiResult<Json<Deal>> {
    let deal = state
        .blocking(move |_, db| sprint::update_deal(db, id, patch, Utc::now()))
        .await?;
    Ok(Json(deal))
}

async fn delete_deal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.blocking(move |_, db| sprint::delete_deal(db, id)).await?))
}

async fn deal_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DealDetail>> {
    let detail = state
        .blocking(move |_, db| sprint::deal_detail(db, id, Utc::now()))
        .await?;
    Ok(Json(detail))
}

async fn move_deal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<MoveOutcome>> {
    let outcome = state
        .blocking(move |_, db| sprint::move_deal(db, id, &update, Utc::now()))
        .await?;
    Ok(Json(outcome))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(comment): Json<NewComment>,
) -> ApiResult<Json<Comment>> {
    let comment = state
        .blocking(move |_, db| sprint::add_comment(db, id, &comment, Utc::now()))
        .await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.blocking(move |_, db| sprint::delete_comment(db, id)).await?))
}

async fn mark_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Deal>> {
    let deal = state
        .blocking(move |_, db| sprint::mark_reminder_sent(db, id, Utc::now()))
        .await?;
    Ok(Json(deal))
}

async fn reminders(State(state): State<AppState>) -> ApiResult<Json<Vec<DueReminder>>> {
    let due = state
        .blocking(|state, db| sprint::due_reminders(db, Utc::now(), state.config.contract))
        .await?;
    Ok(Json(due))
}

async fn list_persons(State(state): State<AppState>) -> ApiResult<Json<Vec<Person>>> {
    Ok(Json(state.blocking(|_, db| sprint::list_persons(db)).await?))
}

async fn create_person(
    State(state): State<AppState>,
    Json(person): Json<NewPerson>,
) -> ApiResult<Json<Person>> {
    let person = state
        .blocking(move |_, db| sprint::create_person(db, &person, Utc::now()))
        .await?;
    Ok(Json(person))
}

#[derive(Debug, Default, Deserialize)]
struct InsightParams {
    status: Option<String>,
}

/// GET and POST both run the agent for the deal's column (or `?status=`).
async fn insight(
    State(state): State<AppState>,
    Path(deal_id): Path<i64>,
    Query(params): Query<InsightParams>,
) -> ApiResult<Json<InsightOutcome>> {
    let outcome = state
        .blocking_unlocked(move |state| {
            let status = params.status.as_deref().map(DealStatus::parse).transpose()?;
            insights::generate_insight(&*state.db, &state.agents, deal_id, status, Utc::now())
        })
        .await?;
    Ok(Json(outcome))
}

async fn qualification(
    State(state): State<AppState>,
    Path(deal_id): Path<i64>,
) -> ApiResult<Json<QualificationInsight>> {
    let insight = state
        .blocking_unlocked(move |state| {
            insights::qualify(&*state.db, &state.agents, deal_id, Utc::now())
        })
        .await?;
    Ok(Json(insight))
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.blocking(|_, db| dashboard::dashboard(db, Utc::now())).await?))
}

async fn analytics(State(state): State<AppState>) -> ApiResult<Json<Analytics>> {
    let analytics = state
        .blocking(|state, db| {
            dashboard::analytics(db, Utc::now(), state.config.analytics.default_win_rate)
        })
        .await?;
    Ok(Json(analytics))
}

#[derive(Debug, Deserialize)]
struct ContactListParams {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_page_size")]
    limit: u32,
    search: Option<String>,
    status: Option<ContactStatus>,
    company: Option<String>,
    owner_id: Option<i64>,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ContactListParams>,
) -> ApiResult<Json<Vec<Contact>>> {
    let query = ContactQuery {
        skip: params.skip,
        limit: params.limit,
        search: params.search,
        status: params.status,
        company: params.company,
        owner_id: params.owner_id,
    };
    let contacts = state
        .blocking(move |_, db| contacts::list_contacts(db, &query))
        .await?;
    Ok(Json(contacts))
}

async fn create_contact(
    State(state): State<AppState>,
    Json(contact): Json<NewContact>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .blocking(move |_, db| contacts::create_contact(db, &contact, Utc::now()))
        .await?;
    Ok(Json(contact))
}

async fn contact_stats(State(state): State<AppState>) -> ApiResult<Json<ContactStats>> {
    Ok(Json(state.blocking(|_, db| contacts::contact_stats(db)).await?))
}

async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.blocking(move |_, db| contacts::get_contact(db, id)).await?))
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ContactPatch>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .blocking(move |_, db| contacts::update_contact(db, id, patch, Utc::now()))
        .await?;
    Ok(Json(contact))
}

async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Message>> {
    Ok(Json(state.blocking(move |_, db| contacts::delete_contact(db, id)).await?))
}

async fn success_summary(State(state): State<AppState>) -> ApiResult<Json<SuccessSummary>> {
    Ok(Json(state.blocking(|_, db| customer_success::summary(db)).await?))
}

#[derive(Debug, Default, Deserialize)]
struct SuccessListParams {
    search: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

async fn success_customers(
    State(state): State<AppState>,
    Query(params): Query<SuccessListParams>,
) -> ApiResult<Json<Vec<CustomerRow>>> {
    let query = CustomerQuery {
        search: params.search,
        sort_by: SortBy::from_param(params.sort_by.as_deref()),
        sort_order: SortOrder::from_param(params.sort_order.as_deref()),
    };
    let rows = state
        .blocking(move |_, db| customer_success::customers(db, &query))
        .await?;
    Ok(Json(rows))
}

async fn success_customer(
    State(state): State<AppState>,
    Path(deal_id): Path<i64>,
) -> ApiResult<Json<CustomerDetail>> {
    let detail = state
        .blocking(move |_, db| customer_success::customer(db, deal_id))
        .await?;
    Ok(Json(detail))
}

async fn record_satisfaction(
    State(state): State<AppState>,
    Path(deal_id): Path<i64>,
    Json(record): Json<CustomerSatisfaction>,
) -> ApiResult<Json<CustomerSatisfaction>> {
    let record = state
        .blocking(move |_, db| {
            customer_success::record_satisfaction(db, deal_id, record, Utc::now())
        })
        .await?;
    Ok(Json(record))
}
