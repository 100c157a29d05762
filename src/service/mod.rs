//! Park service - the backend the booking form reads availability from and submits to
//!
//! Two implementations share the [`ParkService`] trait:
//! - [`HttpParkService`] talks to the park's JSON API
//! - [`LocalParkService`] keeps an in-memory ledger (offline mode, tests)

pub mod http;
pub mod local;
pub mod wire;

use chrono::NaiveDate;
use miette::Diagnostic;
use std::collections::HashSet;
use thiserror::Error;

use crate::core::availability::AvailabilitySource;
use crate::entities::activity::Catalog;
use crate::entities::registration::{Confirmation, Dni, Registration};
use crate::entities::slot::SlotTime;

pub use http::HttpParkService;
pub use local::LocalParkService;

/// Errors surfaced by a park service
#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    /// Network-level failure; the user only sees a generic notice
    #[error("could not reach the park service, please try again later")]
    #[diagnostic(
        code(ecopark::service::unreachable),
        help("check your connection, the configured api_url, or run with --offline")
    )]
    Unreachable(#[source] reqwest::Error),

    #[error("the park service rejected the request: {0}")]
    #[diagnostic(code(ecopark::service::rejected))]
    Rejected(String),

    #[error("the park service answered with HTTP {status}")]
    #[diagnostic(code(ecopark::service::status))]
    Status { status: u16 },

    #[error("unexpected response from the park service: {0}")]
    #[diagnostic(code(ecopark::service::decode))]
    Decode(String),

    #[error("invalid park service URL '{0}'")]
    #[diagnostic(code(ecopark::service::url))]
    InvalidUrl(String),
}

/// Backend operations the booking form depends on
pub trait ParkService {
    /// Activities on offer
    fn activities(&self) -> Result<Catalog, ServiceError>;

    /// Availability records for every activity on `date`
    fn availability(&self, date: NaiveDate) -> Result<AvailabilitySource, ServiceError>;

    /// Which of `dnis` are already registered at `date`/`time` for any activity
    fn booked_dnis(
        &self,
        date: NaiveDate,
        time: SlotTime,
        dnis: &[Dni],
    ) -> Result<HashSet<Dni>, ServiceError>;

    /// Persist a registration; the service performs its own authoritative checks
    fn submit(&mut self, registration: &Registration) -> Result<Confirmation, ServiceError>;

    /// Short label for logs and status output
    fn describe(&self) -> String;
}
