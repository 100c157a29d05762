//! Entity type definitions
//!
//! - [`Activity`] and the [`Catalog`] of activities on offer
//! - [`SlotTime`] and per-slot availability records
//! - [`Registration`] with its participants and [`Confirmation`]

pub mod activity;
pub mod registration;
pub mod slot;

pub use activity::{Activity, Catalog, Size};
pub use registration::{
    BookedSeat, BookingDraft, Confirmation, Dni, Participant, ParticipantDraft, Registration,
};
pub use slot::{SlotAvailability, SlotTime, TurnRecord};
