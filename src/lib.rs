//! ecopark: EcoHarmony Park booking toolkit
//!
//! Browse activities, check free slots and register groups for time-slotted
//! park activities, either against the park's HTTP API or an in-memory park.

pub mod cli;
pub mod core;
pub mod entities;
pub mod schema;
pub mod service;
pub mod yaml;
