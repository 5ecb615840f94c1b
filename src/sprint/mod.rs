//! Sprint board workflow: columns, deal moves, contract paperwork.

pub mod board;
pub mod budget;
pub mod contract;
pub mod deals;

use serde::Serialize;

pub use board::{Board, BoardColumn, BoardDeal, board};
pub use budget::parse_budget;
pub use contract::{ContractStatus, DueReminder, contract_status, due_reminders, mark_reminder_sent};
pub use deals::{
    DealDetail, MoveOutcome, StatusUpdate, TimelineEntry, add_comment, create_deal,
    create_person, deal_detail, delete_comment, delete_deal, list_persons, move_deal, update_deal,
};

/// `{"message": ...}` acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
