//! Park service backed by the park's JSON API

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use super::wire::{
    ActivityDto, DniCheckDto, ErrorDto, RegistrationDto, SubmitResponseDto, TurnDto,
};
use super::{ParkService, ServiceError};
use crate::core::availability::AvailabilitySource;
use crate::entities::activity::{Activity, Catalog};
use crate::entities::registration::{Confirmation, Dni, Registration};
use crate::entities::slot::{SlotTime, TurnRecord};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct HttpParkService {
    client: Client,
    base: Url,
}

impl HttpParkService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base = Url::parse(&format!("{trimmed}/"))
            .map_err(|_| ServiceError::InvalidUrl(base_url.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ecopark/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServiceError::Unreachable)?;

        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, ServiceError> {
        self.base
            .join(path)
            .map_err(|_| ServiceError::InvalidUrl(format!("{}{path}", self.base)))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        Self::check(Self::dispatch(request)?)
    }

    fn dispatch(request: RequestBuilder) -> Result<Response, ServiceError> {
        request.send().map_err(|e| {
            warn!(error = %e, "park service request failed");
            ServiceError::Unreachable(e)
        })
    }

    /// Map non-success answers to errors; 4xx bodies carry the backend's detail
    fn check(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        debug!(%status, url = %response.url(), "park service response");
        if status.is_success() {
            return Ok(response);
        }
        if status.is_client_error() {
            let detail = response
                .json::<ErrorDto>()
                .map(|e| e.message())
                .unwrap_or_else(|_| status.to_string());
            return Err(ServiceError::Rejected(detail));
        }
        Err(ServiceError::Status {
            status: status.as_u16(),
        })
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        response
            .json::<T>()
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

impl ParkService for HttpParkService {
    fn activities(&self) -> Result<Catalog, ServiceError> {
        let response = self.send(self.client.get(self.url("api/actividades")?))?;
        let items: Vec<ActivityDto> = Self::decode(response)?;
        Ok(Catalog::new(items.into_iter().map(Activity::from).collect()))
    }

    fn availability(&self, date: NaiveDate) -> Result<AvailabilitySource, ServiceError> {
        let request = self
            .client
            .get(self.url("api/turnos")?)
            .query(&[("fecha", date.to_string())]);
        let items: Vec<TurnDto> = Self::decode(self.send(request)?)?;
        let turns = items
            .into_iter()
            .map(TurnRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ServiceError::Decode)?;
        Ok(AvailabilitySource::Reported(turns))
    }

    fn booked_dnis(
        &self,
        date: NaiveDate,
        time: SlotTime,
        dnis: &[Dni],
    ) -> Result<HashSet<Dni>, ServiceError> {
        let url = self.url("api/inscripciones/dni")?;
        let mut booked = HashSet::new();
        for dni in dnis {
            let request = self.client.get(url.clone()).query(&[
                ("fecha", date.to_string()),
                ("hora", time.to_string()),
                ("dni", dni.to_string()),
            ]);
            let response = Self::dispatch(request)?;
            if response.status() == StatusCode::NOT_FOUND {
                warn!("park service has no DNI lookup, skipping pre-check");
                return Ok(HashSet::new());
            }
            let check: DniCheckDto = Self::decode(Self::check(response)?)?;
            if check.inscripto {
                booked.insert(dni.clone());
            }
        }
        Ok(booked)
    }

    fn submit(&mut self, registration: &Registration) -> Result<Confirmation, ServiceError> {
        let body = RegistrationDto::from(registration);
        let request = self.client.post(self.url("api/inscribirse")?).json(&body);
        let reply: SubmitResponseDto = Self::decode(self.send(request)?)?;

        if !reply.ok {
            return Err(ServiceError::Rejected(
                reply
                    .mensaje
                    .unwrap_or_else(|| "registration was not accepted".to_string()),
            ));
        }

        let message = reply
            .mensaje
            .unwrap_or_else(|| Confirmation::default_message(registration));
        Ok(Confirmation::new(registration.clone(), message))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
