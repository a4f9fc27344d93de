// Report metadata: who the report is about, when it was generated and which
// data periods each dataset covers.
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ProcessError;

pub const REPORT_VERSION: &str = "1.0";
pub const HISTORICAL_START: i32 = 2000;

/// Dataset name and the period used when the caller supplies none.
pub const DEFAULT_PERIODS: [(&str, &str); 5] = [
    ("real_estate_data", "2024-Q4"),
    ("economic_data", "2023"),
    ("demographic_data", "2023"),
    ("tax_data", "2022"),
    ("construction_data", "2024-Q1"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub commune_id: Value,
    pub commune_name: Value,
    pub postal_code: Value,
    pub district: Value,
    pub province: Value,
    pub region: Value,
    pub version: String,
    pub generated_date: String,
    pub temporal_coverage: TemporalCoverage,
    pub data_period: BTreeMap<String, PeriodWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalCoverage {
    pub current_year: i32,
    pub historical_start: i32,
    pub range_years: i32,
}

/// Reference periods of one dataset, from the current one back to 2000.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodWindow {
    pub current: String,
    pub previous_year: String,
    pub five_year: String,
    pub ten_year: String,
    pub fifteen_year: String,
    pub since_2000: String,
    pub historical_range: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Period {
    Annual(i32),
    Quarterly { year: i32, quarter: u32 },
}

impl Period {
    fn parse(raw: &str) -> Result<Self, ProcessError> {
        let invalid = || ProcessError::InvalidPeriod(raw.to_string());
        let s = raw.trim();
        match s.split_once("-Q") {
            Some((year, quarter)) => {
                let year: i32 = year.parse().map_err(|_| invalid())?;
                let quarter: u32 = quarter.parse().map_err(|_| invalid())?;
                if !(1..=4).contains(&quarter) {
                    return Err(invalid());
                }
                Ok(Period::Quarterly { year, quarter })
            }
            None => s.parse().map(Period::Annual).map_err(|_| invalid()),
        }
    }

    /// Step back `n` native periods (years or quarters).
    fn steps_back(self, n: i32) -> Self {
        match self {
            Period::Annual(y) => Period::Annual(y - n),
            Period::Quarterly { year, quarter } => {
                let idx = year * 4 + (quarter as i32 - 1) - n;
                Period::Quarterly {
                    year: idx.div_euclid(4),
                    quarter: idx.rem_euclid(4) as u32 + 1,
                }
            }
        }
    }

    fn years_back(self, years: i32) -> Self {
        match self {
            Period::Annual(_) => self.steps_back(years),
            Period::Quarterly { .. } => self.steps_back(years * 4),
        }
    }

    fn origin(self) -> Self {
        match self {
            Period::Annual(_) => Period::Annual(HISTORICAL_START),
            Period::Quarterly { .. } => Period::Quarterly {
                year: HISTORICAL_START,
                quarter: 1,
            },
        }
    }

    fn label(self) -> String {
        match self {
            Period::Annual(y) => y.to_string(),
            Period::Quarterly { year, quarter } => format!("{}-Q{}", year, quarter),
        }
    }
}

/// Label of the period `n` steps before `period` (quarters for `YYYY-QN`,
/// years for `YYYY`).
pub fn previous_period(period: &str, n: i32) -> Result<String, ProcessError> {
    Ok(Period::parse(period)?.steps_back(n).label())
}

pub fn period_window(current: &str) -> Result<PeriodWindow, ProcessError> {
    let p = Period::parse(current)?;
    let current = p.label();
    let since = p.origin().label();
    Ok(PeriodWindow {
        previous_year: p.years_back(1).label(),
        five_year: p.years_back(5).label(),
        ten_year: p.years_back(10).label(),
        fifteen_year: p.years_back(15).label(),
        since_2000: since.clone(),
        historical_range: format!("{} to {}", since, current),
        current,
    })
}

/// Metadata block for one municipality.
///
/// `data_periods` overrides the defaults per dataset; extra datasets are
/// carried through as long as their period parses.
pub fn create_metadata(
    commune: &Value,
    data_periods: &BTreeMap<String, String>,
    today: NaiveDate,
) -> Result<ReportMetadata, ProcessError> {
    let mut periods: BTreeMap<String, String> = DEFAULT_PERIODS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    periods.extend(data_periods.iter().map(|(k, v)| (k.clone(), v.clone())));

    let data_period = periods
        .iter()
        .map(|(dataset, period)| Ok((dataset.clone(), period_window(period)?)))
        .collect::<Result<BTreeMap<_, _>, ProcessError>>()?;

    let field = |key: &str| commune.get(key).cloned().unwrap_or(Value::Null);
    Ok(ReportMetadata {
        commune_id: field("commune_id"),
        commune_name: field("commune_name"),
        postal_code: field("postal_code"),
        district: field("district"),
        province: field("province"),
        region: field("region"),
        version: REPORT_VERSION.to_string(),
        generated_date: today.format("%Y-%m-%d").to_string(),
        temporal_coverage: TemporalCoverage {
            current_year: today.year(),
            historical_start: HISTORICAL_START,
            range_years: today.year() - HISTORICAL_START,
        },
        data_period,
    })
}
