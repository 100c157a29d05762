//! JSON shapes exchanged with the park API
//!
//! The API speaks Spanish field names; these types translate them to and
//! from the crate's entities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entities::activity::Activity;
use crate::entities::registration::{Participant, Registration};
use crate::entities::slot::{SlotTime, TurnRecord};

/// `GET /api/actividades` item
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityDto {
    pub id: u32,
    pub nombre: String,
    pub cupos: u32,
    #[serde(default)]
    pub requiere_talle: bool,
    #[serde(default)]
    pub edad_min: Option<u32>,
}

impl From<ActivityDto> for Activity {
    fn from(dto: ActivityDto) -> Self {
        let activity = Activity::new(dto.id, dto.nombre, dto.cupos)
            .with_min_age(dto.edad_min.unwrap_or(0));
        if dto.requiere_talle {
            activity.with_size_required()
        } else {
            activity
        }
    }
}

/// `GET /api/turnos?fecha=` item
#[derive(Debug, Clone, Deserialize)]
pub struct TurnDto {
    #[serde(default)]
    pub id: Option<u32>,
    pub actividad_id: u32,
    pub fecha: NaiveDate,
    pub hora: String,
    pub cupos_disponibles: i64,
}

impl TryFrom<TurnDto> for TurnRecord {
    type Error = String;

    fn try_from(dto: TurnDto) -> Result<Self, Self::Error> {
        let time: SlotTime = dto.hora.parse().map_err(|e| format!("{e}"))?;
        Ok(TurnRecord {
            id: dto.id,
            activity_id: dto.actividad_id,
            date: dto.fecha,
            time,
            available: u32::try_from(dto.cupos_disponibles.max(0)).unwrap_or(u32::MAX),
        })
    }
}

/// `GET /api/inscripciones/dni` response
#[derive(Debug, Clone, Deserialize)]
pub struct DniCheckDto {
    pub inscripto: bool,
}

/// `POST /api/inscribirse` body
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationDto {
    pub actividad: String,
    pub fecha: NaiveDate,
    pub hora: String,
    pub participantes: Vec<VisitorDto>,
    pub email: String,
    pub acepta_terminos: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitorDto {
    pub nombre: String,
    pub dni: u64,
    pub edad: u32,
    pub talle: Option<String>,
}

impl From<&Participant> for VisitorDto {
    fn from(p: &Participant) -> Self {
        Self {
            nombre: p.name.clone(),
            // At most ten digits once validated
            dni: p.dni.as_str().parse().unwrap_or_default(),
            edad: p.age,
            talle: p.size.map(|s| s.to_string()),
        }
    }
}

impl From<&Registration> for RegistrationDto {
    fn from(r: &Registration) -> Self {
        Self {
            actividad: r.activity.clone(),
            fecha: r.date,
            hora: r.time.to_string(),
            participantes: r.participants.iter().map(VisitorDto::from).collect(),
            email: r.email.clone(),
            acepta_terminos: r.accepted_terms,
        }
    }
}

/// `POST /api/inscribirse` success response
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponseDto {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub mensaje: Option<String>,
}

/// FastAPI-style error body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDto {
    pub detail: serde_json::Value,
}

impl ErrorDto {
    /// Human-readable detail; validation errors arrive as a list of objects
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}
