//! Purpose: Pull the statewide and per-county totals out of the decoded dashboard.
//! Exports: `DashboardStats`, `StateTotals`, chart and field name constants.
//! Role: Maps named charts/fields of the vaccine dashboard onto report fields.
//! Invariants: Values are passed through as decoded (integer or real), never coerced.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::regions::region_key;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::workbook::Workbook;

pub const COUNTY_CHART: &str = "County Admin Bar";
pub const ADMINISTERED_CHART: &str = "Administered";
pub const DELIVERED_CHART: &str = "Delivered";
pub const DELIVERED_CDC_CHART: &str = "Delivered CDC";

pub const COUNTY_FIELD: &str = "County";
pub const DOSES_ADMINISTERED: &str = "SUM(Dose Administered)";
pub const DAILY_AVERAGE: &str = "SUM(Daily Avg)";
pub const FULLY_VACCINATED: &str = "SUM(Fully Vaccinated)";
pub const PARTIALLY_VACCINATED: &str = "SUM(Partially Vaccinated)";
pub const DOSES_DELIVERED: &str = "SUM(Doses Delivered)";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTotals {
    pub administered: Value,
    pub administered_per_day_avg: Value,
    pub fully_vaccinated: Value,
    pub partially_vaccinated: Value,
    pub delivered: Value,
    pub cdc_ltcf_delivered: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub state: StateTotals,
    /// Doses administered, keyed by region key.
    pub counties: BTreeMap<String, Value>,
}

impl DashboardStats {
    pub fn from_workbook(workbook: &Workbook) -> Result<Self> {
        let state = StateTotals {
            administered: workbook.scalar(ADMINISTERED_CHART, DOSES_ADMINISTERED)?,
            administered_per_day_avg: workbook.scalar(ADMINISTERED_CHART, DAILY_AVERAGE)?,
            fully_vaccinated: workbook.scalar(ADMINISTERED_CHART, FULLY_VACCINATED)?,
            partially_vaccinated: workbook.scalar(ADMINISTERED_CHART, PARTIALLY_VACCINATED)?,
            delivered: workbook.scalar(DELIVERED_CHART, DOSES_DELIVERED)?,
            cdc_ltcf_delivered: workbook.scalar(DELIVERED_CDC_CHART, DOSES_DELIVERED)?,
        };

        let mut counties = BTreeMap::new();
        for (index, mut row) in workbook.rows(COUNTY_CHART)?.into_iter().enumerate() {
            let name = match row.get(COUNTY_FIELD) {
                Some(Value::String(name)) => name.clone(),
                Some(_) | None => return Err(missing_field(COUNTY_FIELD, index)),
            };
            let administered = row
                .remove(DOSES_ADMINISTERED)
                .ok_or_else(|| missing_field(DOSES_ADMINISTERED, index))?;
            counties.insert(region_key(&name), administered);
        }
        tracing::debug!(counties = counties.len(), "decoded dashboard totals");

        Ok(Self { state, counties })
    }
}

fn missing_field(field: &str, row: usize) -> Error {
    Error::new(ErrorKind::FieldNotFound)
        .with_message(format!("row {row} has no string `{field}`"))
        .with_path(COUNTY_CHART)
}
