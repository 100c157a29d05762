//! Step validation rules
//!
//! Every rule reports through [`ValidationIssue`]; a step collects all of its
//! issues instead of stopping at the first one so the user can fix everything
//! in a single pass. Nothing in here has side effects.

use chrono::NaiveDateTime;
use miette::Diagnostic;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::core::availability::{is_elapsed, AvailabilityResolver};
use crate::core::calendar::{DateRejection, ParkCalendar};
use crate::core::form::Selection;
use crate::entities::activity::{Activity, Catalog, Size, UnknownSize};
use crate::entities::registration::{Dni, Participant, ParticipantDraft};
use crate::entities::slot::SlotTime;

pub const DNI_MIN_DIGITS: usize = 6;
pub const DNI_MAX_DIGITS: usize = 10;
pub const MAX_AGE: i64 = 150;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L} ]+$").expect("name pattern is valid"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// What is wrong with a field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssueKind {
    #[error("select an activity")]
    ActivityMissing,

    #[error("unknown activity '{0}'")]
    ActivityUnknown(String),

    #[error("select a date")]
    DateMissing,

    #[error(transparent)]
    Date(#[from] DateRejection),

    #[error("select a time slot")]
    TimeMissing,

    #[error("the {0} slot has no places left or is not offered that day")]
    SlotUnavailable(SlotTime),

    #[error("the {0} slot is no longer valid for today; pick a later time")]
    SlotElapsed(SlotTime),

    #[error("number of people must be at least 1")]
    PartyEmpty,

    #[error("only {remaining} place(s) left for that slot ({requested} requested)")]
    PartyTooLarge { requested: u32, remaining: u32 },

    #[error("name is required")]
    NameMissing,

    #[error("name may only contain letters and spaces")]
    NameInvalid,

    #[error("DNI must have 6 to 10 digits")]
    DniLength,

    #[error("age must be a whole number")]
    AgeNotNumeric,

    #[error("age must be between 1 and 150")]
    AgeOutOfRange,

    #[error("minimum age for {activity} is {min_age}")]
    AgeBelowMinimum { activity: String, min_age: u32 },

    #[error("size is required for {0}")]
    SizeMissing(String),

    #[error(transparent)]
    SizeUnknown(#[from] UnknownSize),

    #[error("DNI {dni} is repeated in this registration (also in row {first_row})")]
    DniDuplicate { dni: Dni, first_row: usize },

    #[error("DNI {0} is already registered for another activity at the same time")]
    DniAlreadyBooked(Dni),

    #[error("enter a valid email for the confirmation")]
    EmailInvalid,

    #[error("you must accept the terms and conditions")]
    TermsNotAccepted,

    #[error("availability changed: only {remaining} place(s) left, {requested} needed")]
    CapacityChanged { requested: u32, remaining: u32 },
}

/// A single blocking problem, optionally tied to a participant row (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Diagnostic)]
pub struct ValidationIssue {
    pub row: Option<usize>,
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub fn new(kind: impl Into<IssueKind>) -> Self {
        Self {
            row: None,
            kind: kind.into(),
        }
    }

    pub fn at_row(row: usize, kind: impl Into<IssueKind>) -> Self {
        Self {
            row: Some(row),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "Row {}: {}", row, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ValidationIssue {}

/// Selection fields a later step needs but finds empty or unknown
pub fn missing_selection(selection: &Selection, catalog: &Catalog) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    match selection.activity.as_deref().map(str::trim) {
        None | Some("") => issues.push(ValidationIssue::new(IssueKind::ActivityMissing)),
        Some(name) if catalog.find(name).is_none() => {
            issues.push(ValidationIssue::new(IssueKind::ActivityUnknown(name.to_string())))
        }
        Some(_) => {}
    }
    if selection.date.is_none() {
        issues.push(ValidationIssue::new(IssueKind::DateMissing));
    }
    if selection.time.is_none() {
        issues.push(ValidationIssue::new(IssueKind::TimeMissing));
    }
    issues
}

/// Validate the selection step (activity, date, slot, party size)
pub fn validate_selection(
    selection: &Selection,
    catalog: &Catalog,
    calendar: &ParkCalendar,
    resolver: &AvailabilityResolver<'_>,
    now: NaiveDateTime,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    let activity = match selection.activity.as_deref().map(str::trim) {
        None | Some("") => {
            issues.push(ValidationIssue::new(IssueKind::ActivityMissing));
            None
        }
        Some(name) => {
            let found = catalog.find(name);
            if found.is_none() {
                issues.push(ValidationIssue::new(IssueKind::ActivityUnknown(
                    name.to_string(),
                )));
            }
            found
        }
    };

    let date = match selection.date {
        None => {
            issues.push(ValidationIssue::new(IssueKind::DateMissing));
            None
        }
        Some(date) => match calendar.check(date) {
            Ok(()) => Some(date),
            Err(rejection) => {
                issues.push(ValidationIssue::new(rejection));
                None
            }
        },
    };

    if selection.party_size == 0 {
        issues.push(ValidationIssue::new(IssueKind::PartyEmpty));
    }

    let Some(time) = selection.time else {
        issues.push(ValidationIssue::new(IssueKind::TimeMissing));
        return issues;
    };

    // Slot checks need a valid activity and date
    let (Some(activity), Some(date)) = (activity, date) else {
        return issues;
    };

    if is_elapsed(date, time, now) {
        issues.push(ValidationIssue::new(IssueKind::SlotElapsed(time)));
        return issues;
    }

    if !resolver.is_open(activity, date, time, now) {
        issues.push(ValidationIssue::new(IssueKind::SlotUnavailable(time)));
        return issues;
    }

    let remaining = resolver.remaining(activity, date, time);
    if selection.party_size > remaining {
        issues.push(ValidationIssue::new(IssueKind::PartyTooLarge {
            requested: selection.party_size,
            remaining,
        }));
    }

    issues
}

/// Validate one participant row in isolation
pub fn validate_participant(
    row: usize,
    draft: &ParticipantDraft,
    activity: &Activity,
) -> Result<Participant, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let name = draft.name.trim();
    if name.is_empty() {
        issues.push(ValidationIssue::at_row(row, IssueKind::NameMissing));
    } else if !NAME_RE.is_match(name) {
        issues.push(ValidationIssue::at_row(row, IssueKind::NameInvalid));
    }

    let dni = Dni::normalize(&draft.dni);
    if !(DNI_MIN_DIGITS..=DNI_MAX_DIGITS).contains(&dni.len()) {
        issues.push(ValidationIssue::at_row(row, IssueKind::DniLength));
    }

    let age = match draft.age.trim().parse::<i64>() {
        Err(_) => {
            issues.push(ValidationIssue::at_row(row, IssueKind::AgeNotNumeric));
            None
        }
        Ok(age) if !(1..=MAX_AGE).contains(&age) => {
            issues.push(ValidationIssue::at_row(row, IssueKind::AgeOutOfRange));
            None
        }
        Ok(age) => {
            let age = age as u32;
            if age < activity.min_age {
                issues.push(ValidationIssue::at_row(
                    row,
                    IssueKind::AgeBelowMinimum {
                        activity: activity.name.clone(),
                        min_age: activity.min_age,
                    },
                ));
            }
            Some(age)
        }
    };

    let size = if activity.requires_size {
        match draft.size.as_deref().map(str::trim) {
            None | Some("") => {
                issues.push(ValidationIssue::at_row(
                    row,
                    IssueKind::SizeMissing(activity.name.clone()),
                ));
                None
            }
            Some(raw) => match raw.parse::<Size>() {
                Ok(size) => Some(size),
                Err(e) => {
                    issues.push(ValidationIssue::at_row(row, e));
                    None
                }
            },
        }
    } else {
        None
    };

    match (issues.is_empty(), age) {
        (true, Some(age)) => Ok(Participant {
            name: name.to_string(),
            dni,
            age,
            size,
        }),
        _ => Err(issues),
    }
}

/// Validate every participant row plus the cross-row DNI rules
///
/// `already_booked` holds the normalized DNIs the park service reports as
/// registered for the same date and time.
pub fn validate_participants(
    drafts: &[ParticipantDraft],
    activity: &Activity,
    already_booked: &HashSet<Dni>,
) -> Result<Vec<Participant>, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut participants = Vec::with_capacity(drafts.len());
    let mut first_seen: HashMap<Dni, usize> = HashMap::new();

    for (idx, draft) in drafts.iter().enumerate() {
        let row = idx + 1;

        match validate_participant(row, draft, activity) {
            Ok(p) => participants.push(p),
            Err(mut row_issues) => issues.append(&mut row_issues),
        }

        let dni = Dni::normalize(&draft.dni);
        if dni.is_empty() {
            continue;
        }

        if let Some(&first_row) = first_seen.get(&dni) {
            issues.push(ValidationIssue::at_row(
                row,
                IssueKind::DniDuplicate {
                    dni: dni.clone(),
                    first_row,
                },
            ));
        } else {
            first_seen.insert(dni.clone(), row);
        }

        if already_booked.contains(&dni) {
            issues.push(ValidationIssue::at_row(row, IssueKind::DniAlreadyBooked(dni)));
        }
    }

    if issues.is_empty() {
        Ok(participants)
    } else {
        Err(issues)
    }
}

/// Validate the confirmation step (contact email and terms)
pub fn validate_contact(email: &str, accepted_terms: bool) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !is_valid_email(email) {
        issues.push(ValidationIssue::new(IssueKind::EmailInvalid));
    }
    if !accepted_terms {
        issues.push(ValidationIssue::new(IssueKind::TermsNotAccepted));
    }
    issues
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Final capacity re-check right before persisting
pub fn check_capacity(requested: u32, remaining: u32) -> Result<(), ValidationIssue> {
    if requested > remaining {
        Err(ValidationIssue::new(IssueKind::CapacityChanged {
            requested,
            remaining,
        }))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::availability::AvailabilitySource;
    use crate::entities::registration::BookedSeat;
    use chrono::NaiveDate;

    fn palestra() -> Activity {
        Catalog::builtin().find("Palestra").cloned().unwrap()
    }

    fn safari() -> Activity {
        Catalog::builtin().find("Safari").cloned().unwrap()
    }

    fn kinds(issues: &[ValidationIssue]) -> Vec<&IssueKind> {
        issues.iter().map(|i| &i.kind).collect()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    #[test]
    fn test_missing_selection_names_each_gap() {
        let catalog = Catalog::builtin();
        let empty = Selection::default();
        assert_eq!(
            kinds(&missing_selection(&empty, &catalog)),
            vec![&IssueKind::ActivityMissing, &IssueKind::DateMissing, &IssueKind::TimeMissing]
        );

        let mut partial = selection("kayak", tuesday(), "10:00", 1);
        partial.time = None;
        assert_eq!(
            kinds(&missing_selection(&partial, &catalog)),
            vec![&IssueKind::ActivityUnknown("kayak".into()), &IssueKind::TimeMissing]
        );

        let complete = selection("safari", tuesday(), "10:00", 1);
        assert!(missing_selection(&complete, &catalog).is_empty());
    }

    fn selection(activity: &str, date: NaiveDate, time: &str, party: u32) -> Selection {
        Selection {
            activity: Some(activity.to_string()),
            date: Some(date),
            time: Some(time.parse().unwrap()),
            party_size: party,
        }
    }

    #[test]
    fn test_valid_participant() {
        let draft = ParticipantDraft::new("María José", "30.123.456", "25").with_size("m");
        let p = validate_participant(1, &draft, &palestra()).unwrap();
        assert_eq!(p.dni.as_str(), "30123456");
        assert_eq!(p.age, 25);
        assert_eq!(p.size, Some(Size::M));
    }

    #[test]
    fn test_participant_collects_every_problem() {
        let draft = ParticipantDraft::new("", "123", "abc");
        let issues = validate_participant(2, &draft, &palestra()).unwrap_err();
        assert_eq!(
            kinds(&issues),
            vec![
                &IssueKind::NameMissing,
                &IssueKind::DniLength,
                &IssueKind::AgeNotNumeric,
                &IssueKind::SizeMissing("Palestra".to_string()),
            ]
        );
        assert!(issues.iter().all(|i| i.row == Some(2)));
        assert_eq!(issues[0].to_string(), "Row 2: name is required");
    }

    #[test]
    fn test_name_rejects_digits_and_symbols() {
        let draft = ParticipantDraft::new("R2-D2", "1234567", "30");
        let issues = validate_participant(1, &draft, &safari()).unwrap_err();
        assert_eq!(kinds(&issues), vec![&IssueKind::NameInvalid]);
    }

    #[test]
    fn test_age_bounds() {
        for age in ["0", "-3", "151"] {
            let draft = ParticipantDraft::new("Ana", "1234567", age);
            let issues = validate_participant(1, &draft, &safari()).unwrap_err();
            assert_eq!(kinds(&issues), vec![&IssueKind::AgeOutOfRange], "age {age}");
        }
        let ok = ParticipantDraft::new("Ana", "1234567", "150");
        assert!(validate_participant(1, &ok, &safari()).is_ok());
    }

    #[test]
    fn test_minimum_age() {
        let draft = ParticipantDraft::new("Tomás", "1234567", "11").with_size("S");
        let issues = validate_participant(1, &draft, &palestra()).unwrap_err();
        assert_eq!(
            issues[0].to_string(),
            "Row 1: minimum age for Palestra is 12"
        );
    }

    #[test]
    fn test_unknown_size() {
        let draft = ParticipantDraft::new("Ana", "1234567", "30").with_size("XXXL");
        let issues = validate_participant(1, &draft, &palestra()).unwrap_err();
        assert!(matches!(issues[0].kind, IssueKind::SizeUnknown(_)));
    }

    #[test]
    fn test_size_ignored_when_not_required() {
        let draft = ParticipantDraft::new("Ana", "1234567", "30").with_size("anything");
        let p = validate_participant(1, &draft, &safari()).unwrap();
        assert_eq!(p.size, None);
    }

    #[test]
    fn test_duplicate_dni_in_same_form_fails() {
        let drafts = vec![
            ParticipantDraft::new("Ana", "30.123.456", "30"),
            ParticipantDraft::new("Luis", "1234567", "31"),
            ParticipantDraft::new("Eva", "30123456", "32"),
        ];
        let issues = validate_participants(&drafts, &safari(), &HashSet::new()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row, Some(3));
        assert_eq!(
            issues[0].kind,
            IssueKind::DniDuplicate {
                dni: Dni::normalize("30123456"),
                first_row: 1
            }
        );
    }

    #[test]
    fn test_dni_already_booked_elsewhere() {
        let drafts = vec![ParticipantDraft::new("Ana", "30123456", "30")];
        let booked: HashSet<Dni> = [Dni::normalize("30123456")].into_iter().collect();
        let issues = validate_participants(&drafts, &safari(), &booked).unwrap_err();
        assert_eq!(
            kinds(&issues),
            vec![&IssueKind::DniAlreadyBooked(Dni::normalize("30123456"))]
        );
    }

    #[test]
    fn test_contact_rules() {
        assert!(validate_contact("ana@example.com", true).is_empty());
        assert_eq!(
            kinds(&validate_contact("ana@example", false)),
            vec![&IssueKind::EmailInvalid, &IssueKind::TermsNotAccepted]
        );
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_check_capacity() {
        assert!(check_capacity(3, 3).is_ok());
        let issue = check_capacity(4, 3).unwrap_err();
        assert_eq!(
            issue.kind,
            IssueKind::CapacityChanged { requested: 4, remaining: 3 }
        );
    }

    #[test]
    fn test_selection_valid() {
        let catalog = Catalog::builtin();
        let cal = ParkCalendar::new(tuesday());
        let source = AvailabilitySource::Local(Vec::new());
        let resolver = AvailabilityResolver::new(&source, &cal);
        let now = tuesday().and_hms_opt(8, 0, 0).unwrap();

        let sel = selection("Safari", tuesday(), "10:00", 8);
        assert!(validate_selection(&sel, &catalog, &cal, &resolver, now).is_empty());
    }

    #[test]
    fn test_selection_party_exceeds_remaining() {
        let catalog = Catalog::builtin();
        let cal = ParkCalendar::new(tuesday());
        let time: SlotTime = "10:00".parse().unwrap();
        let source = AvailabilitySource::Local(
            (0..6)
                .map(|i| BookedSeat {
                    activity: "Safari".into(),
                    date: tuesday(),
                    time,
                    dni: Dni::normalize(&format!("10000{i}")),
                })
                .collect(),
        );
        let resolver = AvailabilityResolver::new(&source, &cal);
        let now = tuesday().and_hms_opt(8, 0, 0).unwrap();

        let sel = selection("Safari", tuesday(), "10:00", 3);
        let issues = validate_selection(&sel, &catalog, &cal, &resolver, now);
        assert_eq!(
            kinds(&issues),
            vec![&IssueKind::PartyTooLarge { requested: 3, remaining: 2 }]
        );
    }

    #[test]
    fn test_selection_rejects_monday_and_missing_fields() {
        let catalog = Catalog::builtin();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let cal = ParkCalendar::new(sunday);
        let source = AvailabilitySource::Local(Vec::new());
        let resolver = AvailabilityResolver::new(&source, &cal);
        let now = sunday.and_hms_opt(8, 0, 0).unwrap();

        let sel = Selection {
            activity: None,
            date: Some(monday),
            time: None,
            party_size: 0,
        };
        let issues = validate_selection(&sel, &catalog, &cal, &resolver, now);
        assert_eq!(
            kinds(&issues),
            vec![
                &IssueKind::ActivityMissing,
                &IssueKind::Date(DateRejection::Monday),
                &IssueKind::PartyEmpty,
                &IssueKind::TimeMissing,
            ]
        );
    }

    #[test]
    fn test_selection_elapsed_slot_today() {
        let catalog = Catalog::builtin();
        let cal = ParkCalendar::new(tuesday());
        let source = AvailabilitySource::Local(Vec::new());
        let resolver = AvailabilityResolver::new(&source, &cal);
        let now = tuesday().and_hms_opt(12, 10, 0).unwrap();

        let sel = selection("Safari", tuesday(), "12:00", 1);
        let issues = validate_selection(&sel, &catalog, &cal, &resolver, now);
        assert!(matches!(issues[0].kind, IssueKind::SlotElapsed(_)));
    }
}
