//! Activity entity - a bookable park activity and its participation rules

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A bookable activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Backend identifier (matches `actividad_id` on turn records)
    pub id: u32,

    /// Display name, also used as the booking key
    pub name: String,

    /// Seats per time slot
    pub capacity: u32,

    /// Minimum participant age in years (0 = no limit)
    #[serde(default)]
    pub min_age: u32,

    /// Whether every participant must declare a garment size
    #[serde(default)]
    pub requires_size: bool,
}

impl Activity {
    pub fn new(id: u32, name: impl Into<String>, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            min_age: 0,
            requires_size: false,
        }
    }

    pub fn with_min_age(mut self, min_age: u32) -> Self {
        self.min_age = min_age;
        self
    }

    pub fn with_size_required(mut self) -> Self {
        self.requires_size = true;
        self
    }

    /// Name match ignoring case and surrounding whitespace
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Garment size for activities that hand out harnesses or helmets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Size {
    Xs,
    S,
    M,
    L,
    Xl,
    Xxl,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Xs => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::Xl => "XL",
            Size::Xxl => "XXL",
        }
    }

    pub fn all() -> &'static [Size] {
        &[Size::Xs, Size::S, Size::M, Size::L, Size::Xl, Size::Xxl]
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown size '{0}' (expected one of XS, S, M, L, XL, XXL)")]
pub struct UnknownSize(pub String);

impl FromStr for Size {
    type Err = UnknownSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Size::all()
            .iter()
            .find(|size| size.as_str() == wanted)
            .copied()
            .ok_or_else(|| UnknownSize(s.to_string()))
    }
}

/// The set of activities offered by the park
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    activities: Vec<Activity>,
}

impl Catalog {
    pub fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// The activities the park runs when no backend is consulted
    pub fn builtin() -> Self {
        Self::new(vec![
            Activity::new(1, "Safari", 8),
            Activity::new(2, "Palestra", 12)
                .with_min_age(12)
                .with_size_required(),
            Activity::new(3, "Jardinería", 12),
            Activity::new(4, "Tirolesa", 10)
                .with_min_age(8)
                .with_size_required(),
        ])
    }

    /// Look up an activity by name, ignoring case and surrounding whitespace
    pub fn find(&self, name: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.is_named(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.activities.iter().map(|a| a.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}
