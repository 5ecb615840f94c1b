//! Storage layer for sprintboard
//!
//! A single SQLite database holds the sprint board, the contact book and the
//! lifecycle analytics tables. Repository methods are grouped per aggregate.

pub mod artifacts;
pub mod contacts;
pub mod customers;
pub mod deals;
pub mod migrations;
pub mod persons;
pub mod satisfaction;
pub mod sqlite;

pub use contacts::ContactQuery;
pub use deals::DealFilter;
pub use sqlite::{Database, DbAccess};
