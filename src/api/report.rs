//! Purpose: Merge dashboard totals and equity groupings into the published report.
//! Exports: `Report`, `StateReport`, `CountyReport`, `assemble`, `generate`.
//! Role: Top-level orchestration: fetch, frame, decode, merge.
//! Invariants: Every configured region must appear in both sources or the run fails.
//! Invariants: No partial report is returned on any error.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use time::Date;

use super::dashboard::DashboardClient;
use super::equity::{EquityClient, Groupings, RegionGroupings};
use super::stats::{COUNTY_CHART, DashboardStats, StateTotals};
use crate::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::stamp;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateReport {
    #[serde(flatten)]
    pub groupings: RegionGroupings,
    #[serde(flatten)]
    pub totals: StateTotals,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CountyReport {
    #[serde(flatten)]
    pub groupings: RegionGroupings,
    pub total_administered: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub date: String,
    pub state: StateReport,
    pub counties: BTreeMap<String, CountyReport>,
}

/// Merge both sources for `regions`.
pub fn assemble(
    date: String,
    stats: DashboardStats,
    groupings: Groupings,
    regions: &[String],
) -> Result<Report> {
    let DashboardStats {
        state: totals,
        counties: mut administered,
    } = stats;
    let Groupings {
        state,
        counties: mut county_groupings,
    } = groupings;

    let mut counties = BTreeMap::new();
    for region in regions {
        let total_administered = administered.remove(region).ok_or_else(|| {
            Error::new(ErrorKind::RowNotFound)
                .with_message(format!("region `{region}` is missing from the dashboard"))
                .with_path(COUNTY_CHART)
        })?;
        let groupings = county_groupings.remove(region).ok_or_else(|| {
            Error::new(ErrorKind::RowNotFound)
                .with_message(format!("region `{region}` has no equity groupings"))
        })?;
        counties.insert(
            region.clone(),
            CountyReport {
                groupings,
                total_administered,
            },
        );
    }
    if !administered.is_empty() {
        let extra = administered.keys().cloned().collect::<Vec<_>>();
        tracing::warn!(?extra, "dashboard lists regions outside the configured set");
    }

    Ok(Report {
        date,
        state: StateReport {
            groupings: state,
            totals,
        },
        counties,
    })
}

/// Fetch both sources and build the report stamped with `date`.
pub fn generate(config: &Config, date: Date) -> Result<Report> {
    config.validate()?;
    let stats = fetch_dashboard_stats(config)?;
    let groupings = EquityClient::from_config(config)?.fetch_groupings(
        &config.state_region,
        &config.regions,
        config.concurrency,
    )?;
    let report = assemble(stamp::format_date(date)?, stats, groupings, &config.regions)?;
    tracing::info!(counties = report.counties.len(), date = %report.date, "report assembled");
    Ok(report)
}

pub fn fetch_dashboard_stats(config: &Config) -> Result<DashboardStats> {
    let workbook =
        DashboardClient::from_config(config)?.fetch_workbook(&config.view, &config.subview)?;
    DashboardStats::from_workbook(&workbook)
}

#[cfg(test)]
mod tests {
    use super::assemble;
    use crate::api::equity::{Grouping, Groupings, RegionGroupings};
    use crate::api::stats::{DashboardStats, StateTotals};
    use crate::core::error::ErrorKind;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn region(name: &str) -> RegionGroupings {
        RegionGroupings {
            region: name.to_string(),
            latest_update: "2021-02-13".to_string(),
            race_ethnicity: vec![Grouping {
                group: "Latino".to_string(),
                value: json!(0.2),
            }],
            age: vec![Grouping {
                group: "65+".to_string(),
                value: json!(0.5),
            }],
            gender: vec![],
        }
    }

    fn stats(counties: &[(&str, i64)]) -> DashboardStats {
        DashboardStats {
            state: StateTotals {
                administered: json!(100),
                administered_per_day_avg: json!(10.5),
                fully_vaccinated: json!(20),
                partially_vaccinated: json!(60),
                delivered: json!(200),
                cdc_ltcf_delivered: json!(30),
            },
            counties: counties
                .iter()
                .map(|(name, total)| (name.to_string(), json!(total)))
                .collect(),
        }
    }

    fn groupings(counties: &[&str]) -> Groupings {
        Groupings {
            state: region("california"),
            counties: counties
                .iter()
                .map(|name| (name.to_string(), region(name)))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn merges_sources_into_report_shape() {
        let regions = vec!["alpine".to_string(), "sierra".to_string()];
        let report = assemble(
            "2021-02-14".to_string(),
            stats(&[("alpine", 365), ("sierra", 756)]),
            groupings(&["alpine", "sierra"]),
            &regions,
        )
        .expect("assemble");

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["date"], json!("2021-02-14"));
        assert_eq!(value["state"]["region"], json!("california"));
        assert_eq!(value["state"]["administered"], json!(100));
        assert_eq!(value["state"]["cdc_ltcf_delivered"], json!(30));
        assert_eq!(
            value["state"]["race_ethnicity"],
            json!([{"group": "Latino", "value": 0.2}])
        );
        assert_eq!(value["counties"]["sierra"]["total_administered"], json!(756));
        assert_eq!(value["counties"]["alpine"]["age"][0]["group"], json!("65+"));
        assert_eq!(value["counties"]["alpine"]["gender"], json!([]));
    }

    #[test]
    fn region_missing_from_dashboard_fails() {
        let regions = vec!["alpine".to_string(), "sierra".to_string()];
        let err = assemble(
            "2021-02-14".to_string(),
            stats(&[("alpine", 365)]),
            groupings(&["alpine", "sierra"]),
            &regions,
        )
        .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
        assert_eq!(err.path(), Some("County Admin Bar"));
    }

    #[test]
    fn region_missing_from_groupings_fails() {
        let regions = vec!["alpine".to_string()];
        let err = assemble(
            "2021-02-14".to_string(),
            stats(&[("alpine", 365)]),
            groupings(&[]),
            &regions,
        )
        .expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::RowNotFound);
    }

    #[test]
    fn extra_dashboard_regions_are_ignored() {
        let regions = vec!["alpine".to_string()];
        let report = assemble(
            "2021-02-14".to_string(),
            stats(&[("alpine", 365), ("out_of_state", 1)]),
            groupings(&["alpine"]),
            &regions,
        )
        .expect("assemble");
        assert_eq!(report.counties.len(), 1);
    }
}
