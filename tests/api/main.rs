//! REST API test suite entry point.

#[macro_use]
mod fixture;
mod lifecycle_routes;
mod sprint_routes;
