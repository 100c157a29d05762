//! CLI command implementations

pub mod activities;
pub mod check_date;
pub mod completions;
pub mod config;
pub mod register;
pub mod slots;
pub mod validate;
