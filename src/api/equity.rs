//! Purpose: Fetch per-region vaccine equity files (race/ethnicity, age, gender breakdowns).
//! Exports: `EquityClient`, `Breakdown`, `Grouping`, `RegionGroupings`, `Groupings`.
//! Role: Second data source merged into the report next to the dashboard totals.
//! Invariants: Each region fetch writes only its own slot; results are keyed by region.
//! Invariants: The first failure stops new fetches and fails the whole batch.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::http;
use crate::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::json::parse;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Breakdown {
    RaceEthnicity,
    Age,
    Gender,
}

impl Breakdown {
    fn directory(self) -> &'static str {
        match self {
            Breakdown::RaceEthnicity => "race-ethnicity",
            Breakdown::Age => "age",
            Breakdown::Gender => "gender",
        }
    }

    fn file_name(self, region: &str) -> String {
        let stem = match self {
            Breakdown::RaceEthnicity => "vaccines_by_race_ethnicity",
            Breakdown::Age => "vaccines_by_age",
            Breakdown::Gender => "vaccines_by_gender",
        };
        format!("{stem}_{region}.json")
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grouping {
    pub group: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionGroupings {
    pub region: String,
    pub latest_update: String,
    pub race_ethnicity: Vec<Grouping>,
    pub age: Vec<Grouping>,
    pub gender: Vec<Grouping>,
}

/// Groupings for the state as a whole plus each listed region.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Groupings {
    pub state: RegionGroupings,
    pub counties: BTreeMap<String, RegionGroupings>,
}

#[derive(Debug, Deserialize)]
struct EquityFile {
    meta: EquityMeta,
    data: Vec<EquityRow>,
}

#[derive(Debug, Deserialize)]
struct EquityMeta {
    #[serde(rename = "LATEST_ADMIN_DATE")]
    latest_admin_date: String,
}

#[derive(Debug, Deserialize)]
struct EquityRow {
    #[serde(rename = "CATEGORY")]
    category: String,
    #[serde(rename = "METRIC_VALUE")]
    metric_value: Value,
}

impl EquityFile {
    fn groupings(self) -> Vec<Grouping> {
        self.data
            .into_iter()
            .map(|row| Grouping {
                group: row.category,
                value: row.metric_value,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct EquityClient {
    base_url: Url,
    agent: ureq::Agent,
    max_body_bytes: u64,
}

impl EquityClient {
    pub fn new(base_url: Url, timeout_secs: u64, max_body_bytes: u64) -> Self {
        Self {
            base_url,
            agent: http::build_agent(timeout_secs),
            max_body_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.equity_url()?,
            config.timeout_secs,
            config.max_body_bytes,
        ))
    }

    pub fn fetch_region(&self, region: &str) -> Result<RegionGroupings> {
        let race_ethnicity = self.fetch_file(Breakdown::RaceEthnicity, region)?;
        let latest_update = race_ethnicity.meta.latest_admin_date.clone();
        let age = self.fetch_file(Breakdown::Age, region)?;
        let gender = self.fetch_file(Breakdown::Gender, region)?;
        tracing::debug!(region, latest_update = %latest_update, "fetched equity groupings");
        Ok(RegionGroupings {
            region: region.to_string(),
            latest_update,
            race_ethnicity: race_ethnicity.groupings(),
            age: age.groupings(),
            gender: gender.groupings(),
        })
    }

    /// Fetch the state region and every listed region in one worker batch.
    pub fn fetch_groupings(
        &self,
        state_region: &str,
        regions: &[String],
        concurrency: usize,
    ) -> Result<Groupings> {
        let state_listed = regions.iter().any(|region| region == state_region);
        let mut batch = Vec::with_capacity(regions.len() + 1);
        if !state_listed {
            batch.push(state_region.to_string());
        }
        batch.extend(regions.iter().cloned());

        let mut counties = self.fetch_regions(&batch, concurrency)?;
        let state = if state_listed {
            counties.get(state_region).cloned()
        } else {
            counties.remove(state_region)
        };
        let state = state.ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message(format!("state region `{state_region}` was not fetched"))
        })?;
        Ok(Groupings { state, counties })
    }

    /// Fetch every region on up to `concurrency` worker threads.
    pub fn fetch_regions(
        &self,
        regions: &[String],
        concurrency: usize,
    ) -> Result<BTreeMap<String, RegionGroupings>> {
        let workers = concurrency.clamp(1, regions.len().max(1));
        let next = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        tracing::info!(regions = regions.len(), workers, "fetching equity files");

        let outcomes = std::thread::scope(|scope| {
            let handles = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut done = Vec::new();
                        while !failed.load(Ordering::Relaxed) {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(region) = regions.get(index) else {
                                break;
                            };
                            let outcome = self.fetch_region(region);
                            if outcome.is_err() {
                                failed.store(true, Ordering::Relaxed);
                            }
                            done.push((index, outcome));
                        }
                        done
                    })
                })
                .collect::<Vec<_>>();
            handles
                .into_iter()
                .map(|handle| {
                    handle.join().map_err(|_| {
                        Error::new(ErrorKind::Internal).with_message("equity fetch worker panicked")
                    })
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut ordered = outcomes.into_iter().flatten().collect::<Vec<_>>();
        ordered.sort_by_key(|(index, _)| *index);
        let mut groupings = BTreeMap::new();
        for (_, outcome) in ordered {
            let region = outcome?;
            groupings.insert(region.region.clone(), region);
        }
        Ok(groupings)
    }

    fn fetch_file(&self, breakdown: Breakdown, region: &str) -> Result<EquityFile> {
        let url = http::build_url(
            &self.base_url,
            &[breakdown.directory(), &breakdown.file_name(region)],
        )?;
        let response = http::send(url.as_str(), self.agent.get(url.as_str()).call())?;
        let body = http::read_body(url.as_str(), response, self.max_body_bytes)?;
        parse_equity_file(&body, url.as_str())
    }
}

fn parse_equity_file(body: &str, location: &str) -> Result<EquityFile> {
    parse::from_str::<EquityFile>(body).map_err(|err| {
        Error::new(ErrorKind::SchemaMismatch)
            .with_message("unexpected equity file shape")
            .with_hint(parse::hint_for_error(&err, "equity file"))
            .with_path(location)
            .with_source(err)
    })
}
