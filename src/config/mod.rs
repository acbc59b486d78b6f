//! Typed simulation configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then `LBSIM_*`
//! environment variables. The CLI applies its flags last. Validation fails
//! fast before any core type is constructed.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::Cycle;
use crate::worker::OccupancyPolicy;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Number of workers in the pool.
    pub workers: usize,
    /// Simulation horizon in cycles.
    pub runtime: Cycle,
    /// Initial backlog is `workers * backlog_per_worker` generated items.
    pub backlog_per_worker: usize,
    pub min_duration: Cycle,
    pub max_duration: Cycle,
    /// Chance that an empty-queue cycle produces a new item.
    pub arrival_probability: f64,
    pub policy: OccupancyPolicy,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    /// Report log file, appended to on every run.
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            runtime: 10_000,
            backlog_per_worker: 100,
            min_duration: 2,
            max_duration: 20,
            arrival_probability: 0.5,
            policy: OccupancyPolicy::ImmediateIdle,
            seed: None,
            log_file: PathBuf::from("lbsim.log"),
            log_level: "info".to_string(),
        }
    }
}

impl SimConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overlaid with the environment.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from `LBSIM_*` variables that are set.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = parsed_var("LBSIM_WORKERS")? {
            self.workers = v;
        }
        if let Some(v) = parsed_var("LBSIM_RUNTIME")? {
            self.runtime = v;
        }
        if let Some(v) = parsed_var("LBSIM_BACKLOG_PER_WORKER")? {
            self.backlog_per_worker = v;
        }
        if let Some(v) = parsed_var("LBSIM_MIN_DURATION")? {
            self.min_duration = v;
        }
        if let Some(v) = parsed_var("LBSIM_MAX_DURATION")? {
            self.max_duration = v;
        }
        if let Some(v) = parsed_var("LBSIM_ARRIVAL_PROBABILITY")? {
            self.arrival_probability = v;
        }
        if let Some(v) = parsed_var("LBSIM_POLICY")? {
            self.policy = v;
        }
        if let Some(v) = parsed_var("LBSIM_SEED")? {
            self.seed = Some(v);
        }
        if let Ok(v) = std::env::var("LBSIM_LOG_FILE") {
            self.log_file = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Config("workers must be positive".into()));
        }
        if self.runtime == 0 {
            return Err(Error::Config("runtime must be positive".into()));
        }
        if self.min_duration == 0 {
            return Err(Error::Config("min_duration must be positive".into()));
        }
        if self.min_duration > self.max_duration {
            return Err(Error::Config(format!(
                "min_duration {} exceeds max_duration {}",
                self.min_duration, self.max_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.arrival_probability) {
            return Err(Error::Config(format!(
                "arrival_probability {} is outside [0, 1]",
                self.arrival_probability
            )));
        }
        Ok(())
    }

    /// Size of the backlog generated before the first cycle.
    pub fn initial_backlog(&self) -> usize {
        self.workers * self.backlog_per_worker
    }
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid value for {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
