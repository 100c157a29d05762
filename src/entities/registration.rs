//! Registration entity - participants, bookings and confirmations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ulid::Ulid;

use crate::entities::activity::Size;
use crate::entities::slot::SlotTime;

/// Identity number (DNI) reduced to its digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dni(String);

impl Dni {
    /// Strip everything but ASCII digits ("30.123.456" -> "30123456")
    pub fn normalize(raw: &str) -> Self {
        Dni(raw.chars().filter(|c| c.is_ascii_digit()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Dni {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A participant row as typed by the user, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantDraft {
    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub dni: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub age: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

impl ParticipantDraft {
    pub fn new(name: impl Into<String>, dni: impl Into<String>, age: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dni: dni.into(),
            age: age.into(),
            size: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    /// Parse the compact `name,dni,age[,size]` form used on the command line
    pub fn parse_compact(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [name, dni, age] => Some(Self::new(*name, *dni, *age)),
            [name, dni, age, size] if size.is_empty() => Some(Self::new(*name, *dni, *age)),
            [name, dni, age, size] => Some(Self::new(*name, *dni, *age).with_size(*size)),
            _ => None,
        }
    }
}

/// A validated participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub dni: Dni,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// A complete booking ready to be submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub activity: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub participants: Vec<Participant>,
    pub email: String,
    pub accepted_terms: bool,
}

impl Registration {
    pub fn party_size(&self) -> u32 {
        self.participants.len() as u32
    }

    /// One ledger entry per participant
    pub fn seats(&self) -> Vec<BookedSeat> {
        self.participants
            .iter()
            .map(|p| BookedSeat {
                activity: self.activity.clone(),
                date: self.date,
                time: self.time,
                dni: p.dni.clone(),
            })
            .collect()
    }
}

/// A single occupied seat, the unit the local availability count is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSeat {
    pub activity: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub dni: Dni,
}

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct Confirmation {
    pub reference: String,
    pub message: String,
    pub confirmed_at: DateTime<Utc>,
    pub registration: Registration,
}

impl Confirmation {
    pub fn new(registration: Registration, message: impl Into<String>) -> Self {
        Self {
            reference: format!("INS-{}", Ulid::new()),
            message: message.into(),
            confirmed_at: Utc::now(),
            registration,
        }
    }

    /// Message used when the backend does not supply one
    pub fn default_message(registration: &Registration) -> String {
        format!(
            "Registration confirmed! {} place(s) reserved for {} on {} at {}. A confirmation will be sent to {}.",
            registration.participants.len(),
            registration.activity,
            registration.date,
            registration.time,
            registration.email
        )
    }
}

/// A whole booking described in a YAML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    #[serde(default)]
    pub activity: Option<String>,

    #[serde(default)]
    pub date: Option<NaiveDate>,

    #[serde(default)]
    pub time: Option<SlotTime>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub accept_terms: bool,

    #[serde(default)]
    pub participants: Vec<ParticipantDraft>,
}

/// Accept either a string or a number where users are likely to type both
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(f) => f.to_string(),
    })
}
