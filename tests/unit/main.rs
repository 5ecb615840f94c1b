//! Unit test suite entry point.
//!
//! Table-driven checks of public parsing and policy helpers.

mod budget_tests;
mod config_tests;
mod status_tests;
