//! In-memory park service used in offline mode
//!
//! Holds the built-in catalog (or the one from a seed file) and a ledger of
//! booked seats. Nothing is written back to disk.

use chrono::NaiveDate;
use miette::Diagnostic;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::{ParkService, ServiceError};
use crate::core::availability::AvailabilitySource;
use crate::entities::activity::{Activity, Catalog};
use crate::entities::registration::{BookedSeat, Confirmation, Dni, Registration};
use crate::entities::slot::SlotTime;
use crate::yaml::{parse_yaml_file, YamlError};

/// Seed file layout
///
/// ```yaml
/// activities:            # optional, defaults to the built-in catalog
///   - { id: 1, name: Safari, capacity: 8 }
/// bookings:
///   - { activity: Safari, date: 2026-10-20, time: "10:00", dni: "30123456" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Seed {
    #[serde(default)]
    pub activities: Option<Vec<Activity>>,

    #[serde(default)]
    pub bookings: Vec<BookedSeat>,
}

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Yaml(#[from] YamlError),

    #[error("seed booking {row} names unknown activity '{activity}'")]
    #[diagnostic(
        code(ecopark::seed::unknown_activity),
        help("use one of the catalog's activity names")
    )]
    UnknownActivity { row: usize, activity: String },
}

#[derive(Debug, Clone)]
pub struct LocalParkService {
    catalog: Catalog,
    seats: Vec<BookedSeat>,
}

impl Default for LocalParkService {
    fn default() -> Self {
        Self::new(Catalog::builtin())
    }
}

impl LocalParkService {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            seats: Vec::new(),
        }
    }

    /// Built-in catalog with pre-booked seats
    pub fn with_seats(seats: Vec<BookedSeat>) -> Self {
        Self {
            catalog: Catalog::builtin(),
            seats,
        }
    }

    /// Build from a seed; booked seats take the catalog's spelling of the activity
    pub fn from_seed(seed: Seed) -> Result<Self, SeedError> {
        let catalog = seed
            .activities
            .map(Catalog::new)
            .unwrap_or_else(Catalog::builtin);
        let mut seats = seed.bookings;
        for (i, seat) in seats.iter_mut().enumerate() {
            let activity = catalog
                .find(&seat.activity)
                .ok_or_else(|| SeedError::UnknownActivity {
                    row: i + 1,
                    activity: seat.activity.clone(),
                })?;
            seat.activity = activity.name.clone();
        }
        Ok(Self { catalog, seats })
    }

    /// Load a seed file
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let seed: Seed = parse_yaml_file(path)?;
        debug!(
            path = %path.display(),
            bookings = seed.bookings.len(),
            "loaded offline seed"
        );
        Self::from_seed(seed)
    }

    pub fn seats(&self) -> &[BookedSeat] {
        &self.seats
    }

    pub fn book_seat(&mut self, seat: BookedSeat) {
        self.seats.push(seat);
    }
}

impl ParkService for LocalParkService {
    fn activities(&self) -> Result<Catalog, ServiceError> {
        Ok(self.catalog.clone())
    }

    fn availability(&self, date: NaiveDate) -> Result<AvailabilitySource, ServiceError> {
        Ok(AvailabilitySource::Local(
            self.seats.iter().filter(|s| s.date == date).cloned().collect(),
        ))
    }

    fn booked_dnis(
        &self,
        date: NaiveDate,
        time: SlotTime,
        dnis: &[Dni],
    ) -> Result<HashSet<Dni>, ServiceError> {
        Ok(self
            .seats
            .iter()
            .filter(|s| s.date == date && s.time == time && dnis.contains(&s.dni))
            .map(|s| s.dni.clone())
            .collect())
    }

    fn submit(&mut self, registration: &Registration) -> Result<Confirmation, ServiceError> {
        let activity = self
            .catalog
            .find(&registration.activity)
            .ok_or_else(|| {
                ServiceError::Rejected(format!("unknown activity '{}'", registration.activity))
            })?;

        let source = self.availability(registration.date)?;
        let remaining = source.remaining(activity, registration.date, registration.time);
        if registration.party_size() > remaining {
            return Err(ServiceError::Rejected(format!(
                "not enough places left ({remaining} remaining)"
            )));
        }

        let dnis: Vec<Dni> = registration.participants.iter().map(|p| p.dni.clone()).collect();
        let taken = self.booked_dnis(registration.date, registration.time, &dnis)?;
        if let Some(dni) = taken.iter().next() {
            return Err(ServiceError::Rejected(format!(
                "DNI {dni} is already registered at that time"
            )));
        }

        self.seats.extend(registration.seats());
        Ok(Confirmation::new(
            registration.clone(),
            Confirmation::default_message(registration),
        ))
    }

    fn describe(&self) -> String {
        "offline".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::registration::Participant;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    fn registration(activity: &str, dnis: &[&str]) -> Registration {
        Registration {
            activity: activity.to_string(),
            date: date(),
            time: SlotTime::from_hm(10, 0).unwrap(),
            participants: dnis
                .iter()
                .map(|d| Participant {
                    name: "Visitor".into(),
                    dni: Dni::normalize(d),
                    age: 30,
                    size: None,
                })
                .collect(),
            email: "a@b.co".into(),
            accepted_terms: true,
        }
    }

    #[test]
    fn test_submit_records_seats() {
        let mut service = LocalParkService::default();
        let confirmation = service.submit(&registration("Safari", &["111111", "222222"])).unwrap();
        assert!(confirmation.reference.starts_with("INS-"));
        assert_eq!(service.seats().len(), 2);

        let catalog = service.activities().unwrap();
        let safari = catalog.find("Safari").unwrap();
        let remaining = service
            .availability(date())
            .unwrap()
            .remaining(safari, date(), SlotTime::from_hm(10, 0).unwrap());
        assert_eq!(remaining, 6);
    }

    #[test]
    fn test_submit_rejects_over_capacity() {
        let mut service = LocalParkService::default();
        let dnis: Vec<String> = (0..9).map(|i| format!("10000{i}")).collect();
        let refs: Vec<&str> = dnis.iter().map(String::as_str).collect();
        let err = service.submit(&registration("Safari", &refs)).unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
        assert!(service.seats().is_empty());
    }

    #[test]
    fn test_submit_rejects_dni_conflict_across_activities() {
        let mut service = LocalParkService::default();
        service.submit(&registration("Safari", &["111111"])).unwrap();
        let err = service.submit(&registration("Jardinería", &["111111"])).unwrap_err();
        assert!(err.to_string().contains("111111"));
    }

    #[test]
    fn test_load_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bookings:\n  - activity: Palestra\n    date: 2026-10-20\n    time: \"09:30\"\n    dni: \"333333\""
        )
        .unwrap();

        let service = LocalParkService::load(file.path()).unwrap();
        assert_eq!(service.seats().len(), 1);
        assert_eq!(service.activities().unwrap().len(), 4);

        let booked = service
            .booked_dnis(
                date(),
                SlotTime::from_hm(9, 30).unwrap(),
                &[Dni::normalize("333333"), Dni::normalize("444444")],
            )
            .unwrap();
        assert_eq!(booked.len(), 1);
    }

    #[test]
    fn test_seed_activity_names_are_canonical() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bookings:").unwrap();
        for i in 0..8 {
            writeln!(
                file,
                "  - {{ activity: safari, date: 2026-10-20, time: \"10:00\", dni: \"5000000{i}\" }}"
            )
            .unwrap();
        }

        let mut service = LocalParkService::load(file.path()).unwrap();
        assert!(service.seats().iter().all(|s| s.activity == "Safari"));

        let catalog = service.activities().unwrap();
        let safari = catalog.find("Safari").unwrap();
        let remaining = service
            .availability(date())
            .unwrap()
            .remaining(safari, date(), SlotTime::from_hm(10, 0).unwrap());
        assert_eq!(remaining, 0);

        let err = service.submit(&registration("Safari", &["111111"])).unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[test]
    fn test_seed_rejects_unknown_activity() {
        let seed = Seed {
            activities: None,
            bookings: vec![BookedSeat {
                activity: "Kayak".into(),
                date: date(),
                time: SlotTime::from_hm(10, 0).unwrap(),
                dni: Dni::normalize("111111"),
            }],
        };
        let err = LocalParkService::from_seed(seed).unwrap_err();
        assert!(matches!(err, SeedError::UnknownActivity { row: 1, .. }));
    }

    #[test]
    fn test_seed_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "reservations: []").unwrap();
        assert!(LocalParkService::load(file.path()).is_err());
    }
}
