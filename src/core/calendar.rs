//! Park calendar - booking window, closing days and the daily slot grid

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use thiserror::Error;

use crate::entities::slot::SlotTime;

/// Days ahead of today that can still be booked (inclusive)
pub const BOOKING_WINDOW_DAYS: i64 = 2;

/// Month-day pairs on which the park never opens, whatever the year
pub const HOLIDAYS: [(u32, u32); 2] = [(1, 1), (12, 25)];

/// Why a date cannot be booked
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DateRejection {
    #[error("{0} is in the past")]
    Past(NaiveDate),

    #[error("{date} is too far ahead; bookings are accepted up to {last} (max. 2 days in advance)")]
    BeyondWindow { date: NaiveDate, last: NaiveDate },

    #[error("the park is closed on Mondays")]
    Monday,

    #[error("bookings are not accepted on holidays ({month:02}/{day:02})")]
    Holiday { month: u32, day: u32 },
}

/// Calendar rules evaluated against a fixed "today"
#[derive(Debug, Clone)]
pub struct ParkCalendar {
    today: NaiveDate,
    opening: NaiveTime,
    closing: NaiveTime,
    slot_minutes: u32,
}

impl ParkCalendar {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Last bookable date
    pub fn last_bookable(&self) -> NaiveDate {
        self.today + Duration::days(BOOKING_WINDOW_DAYS)
    }

    /// Accept or reject a date; checks run past, window, Monday, holiday
    pub fn check(&self, date: NaiveDate) -> Result<(), DateRejection> {
        if date < self.today {
            return Err(DateRejection::Past(date));
        }

        let last = self.last_bookable();
        if date > last {
            return Err(DateRejection::BeyondWindow { date, last });
        }

        if date.weekday() == Weekday::Mon {
            return Err(DateRejection::Monday);
        }

        if let Some(&(month, day)) = HOLIDAYS
            .iter()
            .find(|(m, d)| date.month() == *m && date.day() == *d)
        {
            return Err(DateRejection::Holiday { month, day });
        }

        Ok(())
    }

    /// Dates in the booking window that pass every rule
    pub fn bookable_dates(&self) -> Vec<NaiveDate> {
        (0..=BOOKING_WINDOW_DAYS)
            .map(|offset| self.today + Duration::days(offset))
            .filter(|d| self.check(*d).is_ok())
            .collect()
    }

    /// Whether a slot starting at `time` lies within opening hours
    pub fn is_open_at(&self, time: SlotTime) -> bool {
        time.time() >= self.opening && time.time() <= self.closing
    }

    /// Slot start times for one day: opening until the last slot that ends by closing
    pub fn slot_grid(&self) -> Vec<SlotTime> {
        let mut slots = Vec::new();
        let mut current = self.opening;
        let step = Duration::minutes(i64::from(self.slot_minutes));
        while current + step <= self.closing {
            slots.push(SlotTime::from(current));
            current += step;
        }
        slots
    }
}
