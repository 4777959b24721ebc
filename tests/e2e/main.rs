//! E2E test suite entry point.

#[path = "../common/mod.rs"]
mod common;
mod inspect_workflow;
mod list_workflow;
