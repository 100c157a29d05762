//! Per-invocation context: configuration, clock and park service

use chrono::NaiveDateTime;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::cli::helpers::{current_time, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::schema::{SchemaKind, Validator};
use crate::service::{HttpParkService, LocalParkService, ParkService};

pub struct Session {
    pub config: Config,
    pub now: NaiveDateTime,
    pub format: OutputFormat,
    pub quiet: bool,
    pub service: Box<dyn ParkService>,
}

impl Session {
    /// Resolve flags over config and connect to the chosen park service
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let mut config = Config::load();
        if let Some(url) = &global.api_url {
            config.api_url = Some(url.clone());
        }
        if global.offline {
            config.offline = Some(true);
        }
        if let Some(seed) = &global.seed {
            config.seed_file = Some(seed.clone());
            config.offline = Some(true);
        }

        let service: Box<dyn ParkService> = if config.offline() {
            match &config.seed_file {
                Some(path) => Box::new(load_seed(path)?),
                None => Box::new(LocalParkService::default()),
            }
        } else {
            Box::new(HttpParkService::new(config.api_url(), config.timeout())?)
        };
        debug!(service = %service.describe(), "park service ready");

        Ok(Self {
            now: current_time(global)?,
            format: resolve_format(global, &config),
            quiet: global.quiet,
            config,
            service,
        })
    }
}

/// Schema-check a seed file, then load it
fn load_seed(path: &Path) -> Result<LocalParkService> {
    let content = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot read seed file {}", path.display()))?;
    Validator::default().validate(&content, &path.display().to_string(), SchemaKind::Seed)?;
    Ok(LocalParkService::load(path)?)
}
