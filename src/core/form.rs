//! Booking form controller - wizard step and field values
//!
//! The form moves through four steps:
//!
//! ```text
//! Selection -> Participants -> Confirmation -> Completed
//!     ^                             |
//!     +------ capacity shortfall ---+
//! ```
//!
//! [`BookingForm::advance`] validates the current step and only moves on when
//! every rule passes. Rejections carry all issues found in the step and leave
//! the form (and the park service) untouched, except for the capacity
//! re-check at submission which sends the user back to the selection step.
//!
//! Editing a field that an earlier step checked moves the form back to that
//! step, so nothing reaches submission without passing its rules again.

use chrono::{NaiveDate, NaiveDateTime};
use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::availability::{AvailabilityResolver, AvailabilitySource};
use crate::core::calendar::ParkCalendar;
use crate::core::validation::{
    check_capacity, missing_selection, validate_contact, validate_participants, validate_selection,
    ValidationIssue, DNI_MAX_DIGITS, DNI_MIN_DIGITS,
};
use crate::entities::activity::{Activity, Catalog};
use crate::entities::registration::{
    BookingDraft, Confirmation, Dni, Participant, ParticipantDraft, Registration,
};
use crate::entities::slot::{SlotAvailability, SlotTime};
use crate::service::{ParkService, ServiceError};

/// Wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Selection,
    Participants,
    Confirmation,
    Completed,
}

impl Step {
    /// 1-based position shown in the step header
    pub fn number(&self) -> usize {
        match self {
            Step::Selection => 1,
            Step::Participants => 2,
            Step::Confirmation => 3,
            Step::Completed => 4,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Selection => write!(f, "selection"),
            Step::Participants => write!(f, "participants"),
            Step::Confirmation => write!(f, "confirmation"),
            Step::Completed => write!(f, "completed"),
        }
    }
}

/// Fields of the first step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub activity: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<SlotTime>,
    pub party_size: u32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            activity: None,
            date: None,
            time: None,
            party_size: 1,
        }
    }
}

/// A step refused to advance
#[derive(Debug, Error, Diagnostic)]
#[error("{step} step: {} problem(s) to fix", .issues.len())]
#[diagnostic(
    code(ecopark::form::step_rejected),
    help("nothing was booked; correct the fields listed and try again")
)]
pub struct StepRejected {
    /// Step the form is on after the rejection
    pub step: Step,

    #[related]
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum FormError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Rejected(#[from] StepRejected),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Service(#[from] ServiceError),
}

/// The booking wizard's state
#[derive(Debug, Clone)]
pub struct BookingForm {
    catalog: Catalog,
    step: Step,
    selection: Selection,
    participants: Vec<ParticipantDraft>,
    validated: Vec<Participant>,
    email: String,
    accepted_terms: bool,
    confirmation: Option<Confirmation>,
}

impl BookingForm {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            step: Step::Selection,
            selection: Selection::default(),
            participants: Vec::new(),
            validated: Vec::new(),
            email: String::new(),
            accepted_terms: false,
            confirmation: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn participants(&self) -> &[ParticipantDraft] {
        &self.participants
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn accepted_terms(&self) -> bool {
        self.accepted_terms
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    /// The selected activity, if it is in the catalog
    pub fn activity(&self) -> Option<&Activity> {
        self.selection
            .activity
            .as_deref()
            .and_then(|name| self.catalog.find(name))
    }

    /// Changing the activity invalidates the chosen slot
    pub fn set_activity(&mut self, name: impl Into<String>) {
        self.selection.activity = Some(name.into());
        self.selection.time = None;
        self.rewind(Step::Selection);
    }

    /// Changing the date invalidates the chosen slot
    pub fn set_date(&mut self, date: NaiveDate) {
        self.selection.date = Some(date);
        self.selection.time = None;
        self.rewind(Step::Selection);
    }

    pub fn set_time(&mut self, time: SlotTime) {
        self.selection.time = Some(time);
        self.rewind(Step::Selection);
    }

    pub fn set_party_size(&mut self, size: u32) {
        self.selection.party_size = size;
        self.rewind(Step::Selection);
    }

    /// Replace the participant row at `index` (0-based), growing the table if needed
    pub fn set_participant(&mut self, index: usize, draft: ParticipantDraft) {
        if index >= self.participants.len() {
            self.participants.resize(index + 1, ParticipantDraft::default());
        }
        self.participants[index] = draft;
        self.rewind(Step::Participants);
    }

    pub fn set_participants(&mut self, drafts: Vec<ParticipantDraft>) {
        self.participants = drafts;
        self.rewind(Step::Participants);
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_accepted_terms(&mut self, accepted: bool) {
        self.accepted_terms = accepted;
    }

    /// Load every field from a booking draft; the party size follows the participant list
    pub fn apply_draft(&mut self, draft: &BookingDraft) {
        self.selection = Selection {
            activity: draft.activity.clone(),
            date: draft.date,
            time: draft.time,
            party_size: u32::try_from(draft.participants.len()).unwrap_or(u32::MAX),
        };
        self.participants = draft.participants.clone();
        self.email = draft.email.clone().unwrap_or_default();
        self.accepted_terms = draft.accept_terms;
        self.rewind(Step::Selection);
    }

    /// Forget checked participants and return to `step` if the form is past it
    fn rewind(&mut self, step: Step) {
        self.validated.clear();
        if self.step != Step::Completed && self.step.number() > step.number() {
            debug!(from = %self.step, to = %step, "edited field sends form back");
            self.step = step;
        }
    }

    /// Calendar anchored at the current day
    pub fn calendar(now: NaiveDateTime) -> ParkCalendar {
        ParkCalendar::new(now.date())
    }

    /// Slots still bookable for the selected activity and date
    pub fn open_slots(
        &self,
        service: &dyn ParkService,
        now: NaiveDateTime,
    ) -> Result<Vec<SlotAvailability>, ServiceError> {
        let (Some(activity), Some(date)) = (self.activity(), self.selection.date) else {
            return Ok(Vec::new());
        };
        let calendar = Self::calendar(now);
        if calendar.check(date).is_err() {
            return Ok(Vec::new());
        }
        let source = service.availability(date)?;
        let resolver = AvailabilityResolver::new(&source, &calendar);
        Ok(resolver.open_slots(activity, date, now))
    }

    /// Validate the current step and move to the next one
    pub fn advance(
        &mut self,
        service: &mut dyn ParkService,
        now: NaiveDateTime,
    ) -> Result<Step, FormError> {
        match self.step {
            Step::Selection => self.advance_selection(&*service, now)?,
            Step::Participants => self.advance_participants(&*service)?,
            Step::Confirmation => self.submit(service)?,
            Step::Completed => {}
        }
        Ok(self.step)
    }

    /// Go back one step; field values are kept
    pub fn back(&mut self) -> Step {
        self.step = match self.step {
            Step::Participants => Step::Selection,
            Step::Confirmation => Step::Participants,
            other => other,
        };
        self.step
    }

    /// Start a new booking with the same catalog
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.catalog));
    }

    /// Advance until the confirmation step, then submit unless `dry_run`
    pub fn drive(
        &mut self,
        service: &mut dyn ParkService,
        now: NaiveDateTime,
        dry_run: bool,
    ) -> Result<Step, FormError> {
        loop {
            if self.step == Step::Completed || (dry_run && self.step == Step::Confirmation) {
                break;
            }
            let before = self.step;
            let after = self.advance(service, now)?;
            if after == before {
                break;
            }
        }
        if dry_run && self.step == Step::Confirmation {
            let issues = validate_contact(&self.email, self.accepted_terms);
            if !issues.is_empty() {
                return Err(self.reject(issues).into());
            }
        }
        Ok(self.step)
    }

    fn reject(&self, issues: Vec<ValidationIssue>) -> StepRejected {
        debug!(step = %self.step, count = issues.len(), "step rejected");
        StepRejected {
            step: self.step,
            issues,
        }
    }

    fn advance_selection(
        &mut self,
        service: &dyn ParkService,
        now: NaiveDateTime,
    ) -> Result<(), FormError> {
        let calendar = Self::calendar(now);
        let source = match self.selection.date {
            Some(date) if calendar.check(date).is_ok() && self.activity().is_some() => {
                service.availability(date)?
            }
            _ => AvailabilitySource::Local(Vec::new()),
        };
        let resolver = AvailabilityResolver::new(&source, &calendar);

        let issues = validate_selection(&self.selection, &self.catalog, &calendar, &resolver, now);
        if !issues.is_empty() {
            return Err(self.reject(issues).into());
        }

        let size = self.selection.party_size as usize;
        self.participants.resize(size, ParticipantDraft::default());
        self.step = Step::Participants;
        debug!(party_size = size, "selection accepted");
        Ok(())
    }

    fn advance_participants(&mut self, service: &dyn ParkService) -> Result<(), FormError> {
        let (Some(activity), Some(date), Some(time)) = (
            self.activity().cloned(),
            self.selection.date,
            self.selection.time,
        ) else {
            let issues = missing_selection(&self.selection, &self.catalog);
            self.step = Step::Selection;
            return Err(self.reject(issues).into());
        };

        let mut candidates: Vec<Dni> = self
            .participants
            .iter()
            .map(|p| Dni::normalize(&p.dni))
            .filter(|d| (DNI_MIN_DIGITS..=DNI_MAX_DIGITS).contains(&d.len()))
            .collect();
        candidates.sort();
        candidates.dedup();

        let booked = if candidates.is_empty() {
            Default::default()
        } else {
            service.booked_dnis(date, time, &candidates)?
        };

        match validate_participants(&self.participants, &activity, &booked) {
            Ok(participants) => {
                self.validated = participants;
                self.step = Step::Confirmation;
                debug!(count = self.validated.len(), "participants accepted");
                Ok(())
            }
            Err(issues) => Err(self.reject(issues).into()),
        }
    }

    fn submit(&mut self, service: &mut dyn ParkService) -> Result<(), FormError> {
        let issues = validate_contact(&self.email, self.accepted_terms);
        if !issues.is_empty() {
            return Err(self.reject(issues).into());
        }

        let (Some(activity), Some(date), Some(time)) = (
            self.activity().cloned(),
            self.selection.date,
            self.selection.time,
        ) else {
            let issues = missing_selection(&self.selection, &self.catalog);
            self.step = Step::Selection;
            return Err(self.reject(issues).into());
        };

        // Latest known count, immediately before persisting
        let source = service.availability(date)?;
        let remaining = source.remaining(&activity, date, time);
        let requested = u32::try_from(self.validated.len()).unwrap_or(u32::MAX);
        if let Err(issue) = check_capacity(requested, remaining) {
            warn!(
                activity = %activity.name,
                %date,
                %time,
                requested,
                remaining,
                "availability changed before submission"
            );
            self.step = Step::Selection;
            return Err(self.reject(vec![issue]).into());
        }

        let registration = Registration {
            activity: activity.name.clone(),
            date,
            time,
            participants: self.validated.clone(),
            email: self.email.trim().to_string(),
            accepted_terms: self.accepted_terms,
        };

        let confirmation = service.submit(&registration)?;
        info!(
            reference = %confirmation.reference,
            activity = %registration.activity,
            %date,
            %time,
            party_size = requested,
            "registration confirmed"
        );
        self.confirmation = Some(confirmation);
        self.step = Step::Completed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::IssueKind;
    use crate::entities::registration::BookedSeat;
    use crate::service::LocalParkService;

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    fn morning() -> NaiveDateTime {
        tuesday().and_hms_opt(8, 0, 0).unwrap()
    }

    fn ten() -> SlotTime {
        SlotTime::from_hm(10, 0).unwrap()
    }

    fn filled_form(service: &LocalParkService) -> BookingForm {
        let mut form = BookingForm::new(service.activities().unwrap());
        form.set_activity("Safari");
        form.set_date(tuesday());
        form.set_time(ten());
        form.set_party_size(2);
        form
    }

    fn rejected(err: FormError) -> StepRejected {
        match err {
            FormError::Rejected(r) => r,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_full_flow_books_seats() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);

        assert_eq!(form.advance(&mut service, morning()).unwrap(), Step::Participants);
        assert_eq!(form.participants().len(), 2);

        form.set_participant(0, ParticipantDraft::new("Ana Gómez", "30.123.456", "34"));
        form.set_participant(1, ParticipantDraft::new("Luis Gómez", "40123456", "9"));
        assert_eq!(form.advance(&mut service, morning()).unwrap(), Step::Confirmation);

        form.set_email("ana@example.com");
        form.set_accepted_terms(true);
        assert_eq!(form.advance(&mut service, morning()).unwrap(), Step::Completed);

        let confirmation = form.confirmation().unwrap();
        assert_eq!(confirmation.registration.participants.len(), 2);
        assert_eq!(service.seats().len(), 2);
    }

    #[test]
    fn test_changing_activity_clears_time() {
        let service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.set_activity("Tirolesa");
        assert!(form.selection().time.is_none());
        form.set_time(ten());
        form.set_date(tuesday());
        assert!(form.selection().time.is_none());
    }

    #[test]
    fn test_duplicate_dni_blocks_participants_step() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.advance(&mut service, morning()).unwrap();

        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));
        form.set_participant(1, ParticipantDraft::new("Eva", "30.123.456", "31"));
        let err = rejected(form.advance(&mut service, morning()).unwrap_err());

        assert_eq!(err.step, Step::Participants);
        assert!(matches!(err.issues[0].kind, IssueKind::DniDuplicate { first_row: 1, .. }));
        assert_eq!(form.step(), Step::Participants);
        assert!(service.seats().is_empty());
    }

    #[test]
    fn test_dni_booked_at_same_time_for_other_activity() {
        let mut service = LocalParkService::with_seats(vec![BookedSeat {
            activity: "Palestra".into(),
            date: tuesday(),
            time: ten(),
            dni: Dni::normalize("30123456"),
        }]);
        let mut form = filled_form(&service);
        form.set_party_size(1);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));

        let err = rejected(form.advance(&mut service, morning()).unwrap_err());
        assert!(matches!(err.issues[0].kind, IssueKind::DniAlreadyBooked(_)));
    }

    #[test]
    fn test_capacity_shortfall_returns_to_selection() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));
        form.set_participant(1, ParticipantDraft::new("Luis", "40123456", "35"));
        form.advance(&mut service, morning()).unwrap();

        // Someone else takes seven of the eight Safari places meanwhile
        for i in 0..7 {
            service.book_seat(BookedSeat {
                activity: "Safari".into(),
                date: tuesday(),
                time: ten(),
                dni: Dni::normalize(&format!("5000000{i}")),
            });
        }

        form.set_email("ana@example.com");
        form.set_accepted_terms(true);
        let err = rejected(form.advance(&mut service, morning()).unwrap_err());

        assert_eq!(err.step, Step::Selection);
        assert_eq!(
            err.issues[0].kind,
            IssueKind::CapacityChanged { requested: 2, remaining: 1 }
        );
        assert_eq!(form.step(), Step::Selection);
        assert!(form.confirmation().is_none());
        assert_eq!(service.seats().len(), 7);
    }

    #[test]
    fn test_confirmation_requires_email_and_terms() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.set_party_size(1);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));
        form.advance(&mut service, morning()).unwrap();

        let err = rejected(form.advance(&mut service, morning()).unwrap_err());
        assert_eq!(err.issues.len(), 2);
        assert_eq!(form.step(), Step::Confirmation);
        assert!(service.seats().is_empty());
    }

    #[test]
    fn test_switching_activity_after_participants_revalidates_them() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.set_party_size(1);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Luis", "40123456", "9"));
        assert_eq!(form.advance(&mut service, morning()).unwrap(), Step::Confirmation);

        form.set_activity("Palestra");
        assert_eq!(form.step(), Step::Selection);
        form.set_time(ten());
        form.set_email("ana@example.com");
        form.set_accepted_terms(true);
        assert_eq!(form.advance(&mut service, morning()).unwrap(), Step::Participants);

        let err = rejected(form.advance(&mut service, morning()).unwrap_err());
        let kinds: Vec<&IssueKind> = err.issues.iter().map(|i| &i.kind).collect();
        assert!(kinds.iter().any(|k| matches!(k, IssueKind::AgeBelowMinimum { min_age: 12, .. })));
        assert!(kinds.iter().any(|k| matches!(k, IssueKind::SizeMissing(_))));
        assert_eq!(form.step(), Step::Participants);
        assert!(service.seats().is_empty());
    }

    #[test]
    fn test_editing_participant_at_confirmation_steps_back() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.set_party_size(1);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));
        form.advance(&mut service, morning()).unwrap();

        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "abc"));
        assert_eq!(form.step(), Step::Participants);
        form.set_email("ana@example.com");
        form.set_accepted_terms(true);

        let err = rejected(form.advance(&mut service, morning()).unwrap_err());
        assert_eq!(err.issues[0].kind, IssueKind::AgeNotNumeric);
        assert!(form.confirmation().is_none());
        assert!(service.seats().is_empty());
    }

    #[test]
    fn test_back_and_reset() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.advance(&mut service, morning()).unwrap();
        assert_eq!(form.back(), Step::Selection);
        assert_eq!(form.back(), Step::Selection);
        assert_eq!(form.selection().party_size, 2);

        form.reset();
        assert_eq!(form.step(), Step::Selection);
        assert!(form.selection().activity.is_none());
        assert_eq!(form.catalog().len(), 4);
    }

    #[test]
    fn test_resize_keeps_entered_rows() {
        let mut service = LocalParkService::default();
        let mut form = filled_form(&service);
        form.advance(&mut service, morning()).unwrap();
        form.set_participant(0, ParticipantDraft::new("Ana", "30123456", "34"));
        form.back();
        form.set_party_size(3);
        form.advance(&mut service, morning()).unwrap();
        assert_eq!(form.participants().len(), 3);
        assert_eq!(form.participants()[0].name, "Ana");
        assert!(form.participants()[2].name.is_empty());
    }

    #[test]
    fn test_drive_dry_run_stops_before_submit() {
        let mut service = LocalParkService::default();
        let mut form = BookingForm::new(service.activities().unwrap());
        form.apply_draft(&BookingDraft {
            activity: Some("Safari".into()),
            date: Some(tuesday()),
            time: Some(ten()),
            email: Some("ana@example.com".into()),
            accept_terms: true,
            participants: vec![ParticipantDraft::new("Ana", "30123456", "34")],
        });

        assert_eq!(form.drive(&mut service, morning(), true).unwrap(), Step::Confirmation);
        assert!(service.seats().is_empty());

        assert_eq!(form.drive(&mut service, morning(), false).unwrap(), Step::Completed);
        assert_eq!(service.seats().len(), 1);
    }

    #[test]
    fn test_open_slots_for_today() {
        let service = LocalParkService::default();
        let mut form = BookingForm::new(service.activities().unwrap());
        form.set_activity("Safari");
        form.set_date(tuesday());
        let slots = form
            .open_slots(&service, tuesday().and_hms_opt(17, 0, 0).unwrap())
            .unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].time.to_string(), "17:30");
    }
}
