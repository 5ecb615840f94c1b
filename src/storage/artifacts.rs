//! One-per-deal artifacts (conversation, solution, allocation, proposal) and insights.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::error::Result;
use crate::model::{
    AiInsight, ConversationData, NewInsight, Proposal, ResourceAllocation, TechnicalSolution,
};
use crate::storage::sqlite::{Database, collect_rows};

impl Database {
    pub fn upsert_conversation(&self, data: &ConversationData) -> Result<()> {
        self.conn().execute(
            "INSERT INTO conversation_data (
                deal_id, customer_requirements, business_goals, pain_points, current_solutions,
                tech_preferences, integration_needs, compliance_requirements, project_timeline,
                urgency_level, team_size, decision_makers, sales_notes, communication_channel,
                last_conversation_date
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(deal_id) DO UPDATE SET
                customer_requirements=excluded.customer_requirements,
                business_goals=excluded.business_goals,
                pain_points=excluded.pain_points,
                current_solutions=excluded.current_solutions,
                tech_preferences=excluded.tech_preferences,
                integration_needs=excluded.integration_needs,
                compliance_requirements=excluded.compliance_requirements,
                project_timeline=excluded.project_timeline,
                urgency_level=excluded.urgency_level,
                team_size=excluded.team_size,
                decision_makers=excluded.decision_makers,
                sales_notes=excluded.sales_notes,
                communication_channel=excluded.communication_channel,
                last_conversation_date=excluded.last_conversation_date",
            params![
                data.deal_id,
                data.customer_requirements,
                data.business_goals,
                data.pain_points,
                data.current_solutions,
                data.tech_preferences,
                data.integration_needs,
                data.compliance_requirements,
                data.project_timeline,
                data.urgency_level,
                data.team_size,
                data.decision_makers,
                data.sales_notes,
                data.communication_channel,
                data.last_conversation_date,
            ],
        )?;
        Ok(())
    }

    pub fn get_conversation(&self, deal_id: i64) -> Result<Option<ConversationData>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT deal_id, customer_requirements, business_goals, pain_points, current_solutions,
                        tech_preferences, integration_needs, compliance_requirements, project_timeline,
                        urgency_level, team_size, decision_makers, sales_notes, communication_channel,
                        last_conversation_date
                 FROM conversation_data WHERE deal_id = ?",
                [deal_id],
                |row| {
                    Ok(ConversationData {
                        deal_id: row.get(0)?,
                        customer_requirements: row.get(1)?,
                        business_goals: row.get(2)?,
                        pain_points: row.get(3)?,
                        current_solutions: row.get(4)?,
                        tech_preferences: row.get(5)?,
                        integration_needs: row.get(6)?,
                        compliance_requirements: row.get(7)?,
                        project_timeline: row.get(8)?,
                        urgency_level: row.get(9)?,
                        team_size: row.get(10)?,
                        decision_makers: row.get(11)?,
                        sales_notes: row.get(12)?,
                        communication_channel: row.get(13)?,
                        last_conversation_date: row.get(14)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn upsert_technical_solution(&self, solution: &TechnicalSolution) -> Result<()> {
        self.conn().execute(
            "INSERT INTO technical_solutions (
                deal_id, solution_summary, architecture_overview, recommended_tech_stack,
                integration_approach, development_phases, complexity_score, ai_confidence_score,
                generated_by, generated_at, reviewed_by_human
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(deal_id) DO UPDATE SET
                solution_summary=excluded.solution_summary,
                architecture_overview=excluded.architecture_overview,
                recommended_tech_stack=excluded.recommended_tech_stack,
                integration_approach=excluded.integration_approach,
                development_phases=excluded.development_phases,
                complexity_score=excluded.complexity_score,
                ai_confidence_score=excluded.ai_confidence_score,
                generated_by=excluded.generated_by,
                generated_at=excluded.generated_at,
                reviewed_by_human=excluded.reviewed_by_human",
            params![
                solution.deal_id,
                solution.solution_summary,
                solution.architecture_overview,
                solution.recommended_tech_stack,
                solution.integration_approach,
                solution.development_phases,
                solution.complexity_score,
                solution.ai_confidence_score,
                solution.generated_by,
                solution.generated_at,
                solution.reviewed_by_human,
            ],
        )?;
        Ok(())
    }

    pub fn get_technical_solution(&self, deal_id: i64) -> Result<Option<TechnicalSolution>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT deal_id, solution_summary, architecture_overview, recommended_tech_stack,
                        integration_approach, development_phases, complexity_score, ai_confidence_score,
                        generated_by, generated_at, reviewed_by_human
                 FROM technical_solutions WHERE deal_id = ?",
                [deal_id],
                |row| {
                    Ok(TechnicalSolution {
                        deal_id: row.get(0)?,
                        solution_summary: row.get(1)?,
                        architecture_overview: row.get(2)?,
                        recommended_tech_stack: row.get(3)?,
                        integration_approach: row.get(4)?,
                        development_phases: row.get(5)?,
                        complexity_score: row.get(6)?,
                        ai_confidence_score: row.get(7)?,
                        generated_by: row.get(8)?,
                        generated_at: row.get(9)?,
                        reviewed_by_human: row.get(10)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn upsert_resource_allocation(&self, allocation: &ResourceAllocation) -> Result<()> {
        self.conn().execute(
            "INSERT INTO resource_allocations (
                deal_id, team_composition, resource_timeline, milestone_breakdown,
                development_cost, total_estimated_cost, skill_gaps, ai_confidence_score,
                generated_by, generated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(deal_id) DO UPDATE SET
                team_composition=excluded.team_composition,
                resource_timeline=excluded.resource_timeline,
                milestone_breakdown=excluded.milestone_breakdown,
                development_cost=excluded.development_cost,
                total_estimated_cost=excluded.total_estimated_cost,
                skill_gaps=excluded.skill_gaps,
                ai_confidence_score=excluded.ai_confidence_score,
                generated_by=excluded.generated_by,
                generated_at=excluded.generated_at",
            params![
                allocation.deal_id,
                allocation.team_composition,
                allocation.resource_timeline,
                allocation.milestone_breakdown,
                allocation.development_cost,
                allocation.total_estimated_cost,
                allocation.skill_gaps,
                allocation.ai_confidence_score,
                allocation.generated_by,
                allocation.generated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_resource_allocation(&self, deal_id: i64) -> Result<Option<ResourceAllocation>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT deal_id, team_composition, resource_timeline, milestone_breakdown,
                        development_cost, total_estimated_cost, skill_gaps, ai_confidence_score,
                        generated_by, generated_at
                 FROM resource_allocations WHERE deal_id = ?",
                [deal_id],
                |row| {
                    Ok(ResourceAllocation {
                        deal_id: row.get(0)?,
                        team_composition: row.get(1)?,
                        resource_timeline: row.get(2)?,
                        milestone_breakdown: row.get(3)?,
                        development_cost: row.get(4)?,
                        total_estimated_cost: row.get(5)?,
                        skill_gaps: row.get(6)?,
                        ai_confidence_score: row.get(7)?,
                        generated_by: row.get(8)?,
                        generated_at: row.get(9)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn upsert_proposal(&self, proposal: &Proposal) -> Result<()> {
        self.conn().execute(
            "INSERT INTO proposals (
                deal_id, executive_summary, solution_overview, business_value,
                cost_breakdown, risk_mitigation, proposal_status, generated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(deal_id) DO UPDATE SET
                executive_summary=excluded.executive_summary,
                solution_overview=excluded.solution_overview,
                business_value=excluded.business_value,
                cost_breakdown=excluded.cost_breakdown,
                risk_mitigation=excluded.risk_mitigation,
                proposal_status=excluded.proposal_status,
                generated_at=excluded.generated_at",
            params![
                proposal.deal_id,
                proposal.executive_summary,
                proposal.solution_overview,
                proposal.business_value,
                proposal.cost_breakdown,
                proposal.risk_mitigation,
                proposal.proposal_status,
                proposal.generated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_proposal(&self, deal_id: i64) -> Result<Option<Proposal>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT deal_id, executive_summary, solution_overview, business_value,
                        cost_breakdown, risk_mitigation, proposal_status, generated_at
                 FROM proposals WHERE deal_id = ?",
                [deal_id],
                |row| {
                    Ok(Proposal {
                        deal_id: row.get(0)?,
                        executive_summary: row.get(1)?,
                        solution_overview: row.get(2)?,
                        business_value: row.get(3)?,
                        cost_breakdown: row.get(4)?,
                        risk_mitigation: row.get(5)?,
                        proposal_status: row.get(6)?,
                        generated_at: row.get(7)?,
                    })
                },
            )
            .optional()?)
    }

    pub fn insert_insight(&self, insight: &NewInsight, now: DateTime<Utc>) -> Result<AiInsight> {
        self.conn().execute(
            "INSERT INTO ai_insights (
                deal_id, insight_type, title, description, recommendations, confidence_score,
                triggered_by_status, relevant_data_points, suggested_actions, generated_at,
                ai_model_version
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                insight.deal_id,
                insight.insight_type,
                insight.title,
                insight.description,
                insight.recommendations,
                insight.confidence_score,
                insight.triggered_by_status,
                insight.relevant_data_points,
                insight.suggested_actions,
                now,
                insight.ai_model_version,
            ],
        )?;
        Ok(AiInsight {
            id: self.conn().last_insert_rowid(),
            deal_id: insight.deal_id,
            insight_type: insight.insight_type.clone(),
            title: insight.title.clone(),
            description: insight.description.clone(),
            recommendations: insight.recommendations.clone(),
            confidence_score: insight.confidence_score,
            triggered_by_status: insight.triggered_by_status.clone(),
            relevant_data_points: insight.relevant_data_points.clone(),
            suggested_actions: insight.suggested_actions.clone(),
            generated_at: now,
            ai_model_version: insight.ai_model_version.clone(),
        })
    }

    /// Insights for a deal, newest first.
    pub fn list_insights(&self, deal_id: i64) -> Result<Vec<AiInsight>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, deal_id, insight_type, title, description, recommendations, confidence_score,
                    triggered_by_status, relevant_data_points, suggested_actions, generated_at,
                    ai_model_version
             FROM ai_insights WHERE deal_id = ? ORDER BY generated_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([deal_id], |row| {
            Ok(AiInsight {
                id: row.get(0)?,
                deal_id: row.get(1)?,
                insight_type: row.get(2)?,
                title: row.get(3)?,
                description: row.get(4)?,
                recommendations: row.get(5)?,
                confidence_score: row.get(6)?,
                triggered_by_status: row.get(7)?,
                relevant_data_points: row.get(8)?,
                suggested_actions: row.get(9)?,
                generated_at: row.get(10)?,
                ai_model_version: row.get(11)?,
            })
        })?;
        collect_rows(rows)
    }

    pub fn count_insights(&self, deal_id: i64) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM ai_insights WHERE deal_id = ?",
            [deal_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
