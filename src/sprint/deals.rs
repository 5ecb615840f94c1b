//! Deal workflow: create, edit, move between columns, inspect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SbError};
use crate::model::{
    AiInsight, Comment, ConversationData, Deal, DealPatch, DealStatus, NewComment, NewDeal,
    NewInsight, NewPerson, Person, Priority, Proposal, ResourceAllocation, StatusHistory,
    TechnicalSolution, title_case,
};
use crate::sprint::Message;
use crate::storage::Database;

/// Request to move a deal to another column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub new_status: String,
    #[serde(default)]
    pub change_reason: Option<String>,
    #[serde(default)]
    pub board_position: Option<i64>,
    #[serde(default)]
    pub changed_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub message: String,
    pub deal: Deal,
}

pub fn create_deal(db: &Database, deal: &NewDeal, now: DateTime<Utc>) -> Result<Deal> {
    deal.validate()?;
    let position = db.count_in_status(deal.status, None)?;
    let created = db.insert_deal(deal, position, now)?;
    tracing::info!(deal_id = created.id, status = %created.status, "deal created");
    Ok(created)
}

pub fn update_deal(db: &Database, id: i64, patch: DealPatch, now: DateTime<Utc>) -> Result<Deal> {
    let mut deal = db.require_deal(id)?;
    patch.apply(&mut deal);
    if deal.title.trim().is_empty() {
        return Err(SbError::ValidationFailed("title must not be empty".to_string()));
    }
    deal.updated_at = now;
    db.save_deal(&deal)?;
    Ok(deal)
}

/// Move a deal to a new column.
///
/// The deal is re-assigned to the first person holding the column's owner
/// role, a history row is written, and entering a qualified column queues a
/// placeholder analysis insight. Moving to the current status is allowed.
pub fn move_deal(
    db: &Database,
    id: i64,
    update: &StatusUpdate,
    now: DateTime<Utc>,
) -> Result<MoveOutcome> {
    let new_status = DealStatus::parse(&update.new_status)?;
    let mut deal = db.require_deal(id)?;
    let previous = deal.status;

    let tx = db.transaction()?;

    deal.board_position = match update.board_position {
        Some(position) => position.max(0),
        None => db.count_in_status(new_status, Some(id))?,
    };
    deal.status = new_status;
    deal.assigned_person_id = db
        .first_person_with_role(new_status.owner_role())?
        .map(|person| person.id);
    deal.updated_at = now;
    db.save_deal(&deal)?;

    db.insert_status_history(
        id,
        Some(previous),
        new_status,
        update.changed_by,
        update.change_reason.as_deref(),
        now,
    )?;

    if new_status.is_qualified() {
        let mut insight = NewInsight::new(
            id,
            format!("{new_status}_analysis"),
            format!("AI Analysis for {}", new_status.title()),
        );
        insight.description = Some(format!(
            "Automatic AI analysis triggered for status change to {new_status}"
        ));
        insight.triggered_by_status = Some(new_status.to_string());
        insight.ai_model_version = Some("v1.0".to_string());
        db.insert_insight(&insight, now)?;
    }

    tx.commit()?;
    tracing::info!(
        deal_id = id,
        from = %previous,
        to = %new_status,
        assigned = ?deal.assigned_person_id,
        "deal moved"
    );

    Ok(MoveOutcome {
        message: "Deal status updated successfully".to_string(),
        deal,
    })
}

pub fn delete_deal(db: &Database, id: i64) -> Result<Message> {
    if !db.delete_deal(id)? {
        return Err(SbError::NotFound("Deal not found".to_string()));
    }
    tracing::info!(deal_id = id, "deal deleted");
    Ok(Message::new("Deal deleted successfully"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivitySummary {
    pub days_since_creation: i64,
    pub last_conversation: Option<DateTime<Utc>>,
    pub ai_insights_count: usize,
    pub status: DealStatus,
    pub priority: Priority,
    pub assigned: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DealDetail {
    pub deal: Deal,
    pub conversation_data: Option<ConversationData>,
    pub technical_solution: Option<TechnicalSolution>,
    pub resource_allocation: Option<ResourceAllocation>,
    pub proposal: Option<Proposal>,
    pub ai_insights: Vec<AiInsight>,
    pub status_history: Vec<StatusHistory>,
    pub comments: Vec<Comment>,
    pub timeline: Vec<TimelineEntry>,
    pub activity_summary: ActivitySummary,
}

/// Everything known about one deal plus a merged timeline.
pub fn deal_detail(db: &Database, id: i64, now: DateTime<Utc>) -> Result<DealDetail> {
    let deal = db.require_deal(id)?;
    let conversation_data = db.get_conversation(id)?;
    let ai_insights = db.list_insights(id)?;
    let status_history = db.list_status_history(id)?;
    let comments = db.list_comments(id)?;

    let timeline = build_timeline(&deal, &status_history, &ai_insights);

    let assigned = match deal.assigned_person_id {
        Some(person_id) => db
            .get_person(person_id)?
            .map_or_else(|| "Unassigned".to_string(), |person| person.name),
        None => "Unassigned".to_string(),
    };
    let activity_summary = ActivitySummary {
        days_since_creation: (now - deal.created_at).num_days(),
        last_conversation: conversation_data
            .as_ref()
            .and_then(|data| data.last_conversation_date),
        ai_insights_count: ai_insights.len(),
        status: deal.status,
        priority: deal.priority,
        assigned,
    };

    Ok(DealDetail {
        technical_solution: db.get_technical_solution(id)?,
        resource_allocation: db.get_resource_allocation(id)?,
        proposal: db.get_proposal(id)?,
        deal,
        conversation_data,
        ai_insights,
        status_history,
        comments,
        timeline,
        activity_summary,
    })
}

fn build_timeline(
    deal: &Deal,
    history: &[StatusHistory],
    insights: &[AiInsight],
) -> Vec<TimelineEntry> {
    let mut timeline = vec![TimelineEntry {
        date: deal.created_at,
        kind: "created".to_string(),
        title: "Deal Created".to_string(),
        description: Some(format!("Lead '{}' was created", deal.title)),
        icon: "circle".to_string(),
    }];

    timeline.extend(history.iter().map(|change| {
        let from = change
            .previous_status
            .map_or_else(|| "New".to_string(), DealStatus::title);
        TimelineEntry {
            date: change.timestamp,
            kind: "status_change".to_string(),
            title: format!("Moved from {from} to {}", change.new_status.title()),
            description: change.change_reason.clone(),
            icon: "arrow-right".to_string(),
        }
    }));

    timeline.extend(insights.iter().map(|insight| TimelineEntry {
        date: insight.generated_at,
        kind: "ai_insight".to_string(),
        title: format!(
            "AI {}",
            title_case(&insight.insight_type.replace('_', " "))
        ),
        description: insight.description.clone(),
        icon: "brain".to_string(),
    }));

    timeline.sort_by(|a, b| b.date.cmp(&a.date));
    timeline
}

pub fn add_comment(
    db: &Database,
    deal_id: i64,
    comment: &NewComment,
    now: DateTime<Utc>,
) -> Result<Comment> {
    comment.validate()?;
    db.require_deal(deal_id)?;
    db.insert_comment(deal_id, comment, now)
}

pub fn delete_comment(db: &Database, comment_id: i64) -> Result<Message> {
    if !db.delete_comment(comment_id)? {
        return Err(SbError::NotFound("Comment not found".to_string()));
    }
    Ok(Message::new("Comment deleted successfully"))
}

pub fn list_persons(db: &Database) -> Result<Vec<Person>> {
    db.list_persons(None)
}

pub fn create_person(db: &Database, person: &NewPerson, now: DateTime<Utc>) -> Result<Person> {
    person.validate()?;
    let created = db.insert_person(person, now)?;
    tracing::info!(person_id = created.id, role = created.role.as_str(), "person created");
    Ok(created)
}
