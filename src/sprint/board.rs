//! Kanban view: one column per deal status.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ContractConfig;
use crate::error::Result;
use crate::model::{Deal, DealStatus};
use crate::sprint::contract::{ContractStatus, contract_status};
use crate::storage::{Database, DealFilter};

#[derive(Debug, Clone, Serialize)]
pub struct BoardDeal {
    #[serde(flatten)]
    pub deal: Deal,
    pub contract_status: ContractStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub status: DealStatus,
    pub title: String,
    pub count: usize,
    pub deals: Vec<BoardDeal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
    pub total_deals: usize,
    pub total_value: f64,
}

/// Build the board. Columns follow status order; deals within a column follow position.
pub fn board(db: &Database, now: DateTime<Utc>, policy: ContractConfig) -> Result<Board> {
    let deals = db.list_deals(DealFilter::default())?;
    let total_deals = deals.len();
    let total_value = deals.iter().map(Deal::value).sum();

    let mut columns: Vec<BoardColumn> = DealStatus::ALL
        .iter()
        .map(|status| BoardColumn {
            status: *status,
            title: status.title(),
            count: 0,
            deals: Vec::new(),
        })
        .collect();

    for deal in deals {
        let column = &mut columns[column_index(deal.status)];
        let contract_status = contract_status(&deal, now, policy);
        column.deals.push(BoardDeal {
            deal,
            contract_status,
        });
    }
    for column in &mut columns {
        column.deals.sort_by_key(|entry| entry.deal.board_position);
        column.count = column.deals.len();
    }

    Ok(Board {
        columns,
        total_deals,
        total_value,
    })
}

fn column_index(status: DealStatus) -> usize {
    DealStatus::ALL
        .iter()
        .position(|candidate| *candidate == status)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewDeal;

    #[test]
    fn empty_board_has_all_columns() {
        let db = Database::open_in_memory().unwrap();
        let board = board(&db, Utc::now(), ContractConfig::default()).unwrap();
        assert_eq!(board.columns.len(), 6);
        assert_eq!(board.columns[3].title, "Qualified Cso");
        assert_eq!(board.total_deals, 0);
        assert!(board.total_value.abs() < f64::EPSILON);
    }

    #[test]
    fn deals_land_in_their_columns_and_missing_values_count_as_zero() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        for (title, status, value, position) in [
            ("b", DealStatus::Lead, Some(1_000.0), 1),
            ("a", DealStatus::Lead, None, 0),
            ("c", DealStatus::Project, Some(2_500.0), 0),
        ] {
            db.insert_deal(
                &NewDeal {
                    title: title.into(),
                    status,
                    estimated_value: value,
                    ..NewDeal::default()
                },
                position,
                now,
            )
            .unwrap();
        }

        let board = board(&db, now, ContractConfig::default()).unwrap();
        assert_eq!(board.total_deals, 3);
        assert!((board.total_value - 3_500.0).abs() < f64::EPSILON);
        let lead = &board.columns[0];
        assert_eq!(lead.count, 2);
        assert_eq!(lead.deals[0].deal.title, "a");
        assert_eq!(board.columns[5].count, 1);
    }

    #[test]
    fn board_deal_serializes_flat() {
        let db = Database::open_in_memory().unwrap();
        let now = Utc::now();
        db.insert_deal(
            &NewDeal {
                title: "flat".into(),
                ..NewDeal::default()
            },
            0,
            now,
        )
        .unwrap();
        let board = board(&db, now, ContractConfig::default()).unwrap();
        let json = serde_json::to_value(&board).unwrap();
        let deal = &json["columns"][0]["deals"][0];
        assert_eq!(deal["title"], "flat");
        assert_eq!(deal["contract_status"]["applicable"], false);
    }
}
