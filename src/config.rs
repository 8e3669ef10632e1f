//! Purpose: Runtime configuration for dashboard and equity-file retrieval.
//! Exports: `Config`, default endpoint constants.
//! Role: One place for endpoints, region list, and transport limits; the CLI layers flags on top.
//! Invariants: Every field has a default, so a partial JSON file is a valid config.
//! Invariants: `validate` runs before any network call.
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::regions;
use crate::core::error::{Error, ErrorKind, Result};

pub const DEFAULT_DASHBOARD_HOST: &str = "https://public.tableau.com/";
pub const DEFAULT_VIEW: &str = "COVID-19VaccineDashboardPublicv2";
pub const DEFAULT_SUBVIEW: &str = "Vaccine";
pub const DEFAULT_EQUITY_BASE_URL: &str = "https://files.covid19.ca.gov/data/vaccine-equity/";
pub const DEFAULT_STATE_REGION: &str = "california";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub dashboard_host: String,
    pub view: String,
    pub subview: String,
    pub equity_base_url: String,
    pub state_region: String,
    pub regions: Vec<String>,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub max_body_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dashboard_host: DEFAULT_DASHBOARD_HOST.to_string(),
            view: DEFAULT_VIEW.to_string(),
            subview: DEFAULT_SUBVIEW.to_string(),
            equity_base_url: DEFAULT_EQUITY_BASE_URL.to_string(),
            state_region: DEFAULT_STATE_REGION.to_string(),
            regions: regions::CALIFORNIA_COUNTIES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            concurrency: 8,
            timeout_secs: 60,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load a JSON config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read config file")
                .with_path(path.display().to_string())
                .with_source(err)
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid config file")
                .with_path(path.display().to_string())
                .with_hint("Config is a JSON object; unknown keys are rejected.")
                .with_source(err)
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_base_url(&self.dashboard_host, "dashboard_host")?;
        parse_base_url(&self.equity_base_url, "equity_base_url")?;
        for (value, field) in [(&self.view, "view"), (&self.subview, "subview")] {
            if value.is_empty() || value.contains('/') {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("{field} must be a non-empty name without `/`")));
            }
        }
        if self.concurrency == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("concurrency must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("timeout_secs must be at least 1"));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::new(ErrorKind::Usage).with_message("max_body_bytes must be positive"));
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(region) = self.regions.iter().find(|region| !seen.insert(region.as_str())) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("region `{region}` is listed more than once")));
        }
        for region in std::iter::once(&self.state_region).chain(self.regions.iter()) {
            if *region != regions::region_key(region) {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("region `{region}` is not a normalized key"))
                    .with_hint(format!("Use `{}`.", regions::region_key(region))));
            }
        }
        Ok(())
    }

    pub fn dashboard_url(&self) -> Result<Url> {
        parse_base_url(&self.dashboard_host, "dashboard_host")
    }

    pub fn equity_url(&self) -> Result<Url> {
        parse_base_url(&self.equity_base_url, "equity_base_url")
    }
}

// Base URLs always end in `/` so `Url::join` appends instead of replacing the last segment.
fn parse_base_url(value: &str, field: &str) -> Result<Url> {
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };
    let url = Url::parse(&normalized).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("{field} is not a valid URL"))
            .with_source(err)
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{field} must use http or https, not {scheme}"))),
    }
}
