//! Availability resolution - remaining seats per activity, date and slot
//!
//! Remaining capacity comes from one of two sources:
//! - turn records reported by the backend (authoritative free-seat counts)
//! - a local ledger of booked seats, counted against the activity capacity
//!
//! Either way the result is clamped to `0..=capacity`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::calendar::ParkCalendar;
use crate::entities::activity::Activity;
use crate::entities::registration::BookedSeat;
use crate::entities::slot::{SlotAvailability, SlotTime, TurnRecord};

/// Where remaining-capacity numbers come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "records", rename_all = "snake_case")]
pub enum AvailabilitySource {
    /// Free-seat counts reported by the backend
    Reported(Vec<TurnRecord>),
    /// Seats already taken, counted locally
    Local(Vec<BookedSeat>),
}

impl AvailabilitySource {
    /// Remaining seats for one slot, never negative and never above capacity
    pub fn remaining(&self, activity: &Activity, date: NaiveDate, time: SlotTime) -> u32 {
        match self {
            AvailabilitySource::Reported(turns) => turns
                .iter()
                .find(|t| t.activity_id == activity.id && t.date == date && t.time == time)
                .map(|t| t.available.min(activity.capacity))
                .unwrap_or(0),
            AvailabilitySource::Local(seats) => {
                let taken = seats
                    .iter()
                    .filter(|s| activity.is_named(&s.activity) && s.date == date && s.time == time)
                    .count();
                let taken = u32::try_from(taken).unwrap_or(u32::MAX);
                activity.capacity.saturating_sub(taken)
            }
        }
    }

    /// Candidate slot times for an activity on a date, in order
    fn candidate_times(
        &self,
        activity: &Activity,
        date: NaiveDate,
        calendar: &ParkCalendar,
    ) -> Vec<SlotTime> {
        match self {
            AvailabilitySource::Reported(turns) => {
                let mut times: Vec<SlotTime> = turns
                    .iter()
                    .filter(|t| t.activity_id == activity.id && t.date == date)
                    .map(|t| t.time)
                    .filter(|t| calendar.is_open_at(*t))
                    .collect();
                times.sort();
                times.dedup();
                times
            }
            AvailabilitySource::Local(_) => calendar.slot_grid(),
        }
    }
}

/// Derives per-slot availability for display and step validation
#[derive(Debug, Clone)]
pub struct AvailabilityResolver<'a> {
    source: &'a AvailabilitySource,
    calendar: &'a ParkCalendar,
}

impl<'a> AvailabilityResolver<'a> {
    pub fn new(source: &'a AvailabilitySource, calendar: &'a ParkCalendar) -> Self {
        Self { source, calendar }
    }

    pub fn remaining(&self, activity: &Activity, date: NaiveDate, time: SlotTime) -> u32 {
        self.source.remaining(activity, date, time)
    }

    /// Every known slot for the day with its remaining capacity, full ones included
    pub fn day(&self, activity: &Activity, date: NaiveDate) -> Vec<SlotAvailability> {
        self.source
            .candidate_times(activity, date, self.calendar)
            .into_iter()
            .map(|time| SlotAvailability {
                time,
                capacity: activity.capacity,
                remaining: self.remaining(activity, date, time),
            })
            .collect()
    }

    /// Slots that can still be booked: seats left and, for today, strictly after `now`
    pub fn open_slots(
        &self,
        activity: &Activity,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Vec<SlotAvailability> {
        self.day(activity, date)
            .into_iter()
            .filter(|slot| slot.is_open())
            .filter(|slot| !is_elapsed(date, slot.time, now))
            .collect()
    }

    /// Whether `time` is one of the open slots
    pub fn is_open(
        &self,
        activity: &Activity,
        date: NaiveDate,
        time: SlotTime,
        now: NaiveDateTime,
    ) -> bool {
        self.open_slots(activity, date, now)
            .iter()
            .any(|slot| slot.time == time)
    }
}

/// A slot on today's date whose start is at or before the current minute
pub fn is_elapsed(date: NaiveDate, time: SlotTime, now: NaiveDateTime) -> bool {
    date < now.date() || (date == now.date() && time <= SlotTime::from(now.time()))
}
