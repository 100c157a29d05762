//! Core module - calendar, availability, validation and the booking form

pub mod availability;
pub mod calendar;
pub mod config;
pub mod form;
pub mod roster;
pub mod validation;

pub use availability::{AvailabilityResolver, AvailabilitySource};
pub use calendar::{DateRejection, ParkCalendar};
pub use config::{Config, ConfigError};
pub use form::{BookingForm, FormError, Step, StepRejected};
pub use validation::{IssueKind, ValidationIssue};
