// Per-municipality report assembly: metadata plus every domain section.
use chrono::NaiveDate;
use log::error;

use crate::building_dev::BuildingDevProcessor;
use crate::config::ProcessorConfig;
use crate::economics::EconomicsProcessor;
use crate::error::ProcessError;
use crate::metadata::create_metadata;
use crate::section::Section;
use crate::types::{MunicipalityInput, MunicipalityReport, ReportPreviewRow};
use crate::util::{format_int, format_number};

/// The domain processors configured once and reused for every municipality.
#[derive(Debug, Clone, Default)]
pub struct ReportPipeline {
    building: BuildingDevProcessor,
    economics: EconomicsProcessor,
}

impl ReportPipeline {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            building: BuildingDevProcessor::new(config.construction),
            economics: EconomicsProcessor::new(config.economics),
        }
    }

    /// Build one report. Economic failures are logged and rendered as an
    /// empty section so a single bad dataset cannot abort the report; only
    /// unusable metadata periods fail the whole municipality.
    pub fn assemble(
        &self,
        input: &MunicipalityInput,
        today: NaiveDate,
    ) -> Result<MunicipalityReport, ProcessError> {
        let metadata = create_metadata(&input.commune, &input.data_periods, today)?;
        let building_development = self
            .building
            .process_data(&input.building_development, input.real_estate.as_ref());
        let economic_indicators = match self.economics.process_data(&input.economics) {
            Ok(indicators) => Section::Ready(indicators),
            Err(e) => {
                error!(
                    "Economic indicators failed for commune {}: {}",
                    metadata.commune_id, e
                );
                Section::Missing
            }
        };
        Ok(MunicipalityReport {
            metadata,
            building_development,
            economic_indicators,
        })
    }
}

/// Flatten the headline figures of a report for the console preview.
pub fn preview_row(report: &MunicipalityReport) -> ReportPreviewRow {
    const NA: &str = "N/A";
    let commune = report
        .metadata
        .commune_name
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| report.metadata.commune_id.to_string());

    let permits = report.building_development.permits.as_ready();
    let activity = report.building_development.construction_activity.as_ready();
    let economics = report.economic_indicators.as_ready();
    let unemployment = economics.and_then(|e| e.unemployment.as_ready());
    let business = economics.and_then(|e| e.business_activity.as_ready());

    ReportPreviewRow {
        commune,
        permits: permits
            .map(|p| format_int(p.summary.total_permits_ytd))
            .unwrap_or_else(|| NA.to_string()),
        permits_yoy: permits
            .and_then(|p| p.summary.trend_yoy)
            .map(|t| format!("{}%", format_number(t, 1)))
            .unwrap_or_else(|| NA.to_string()),
        phase: activity
            .map(|a| a.development_phase.label().to_string())
            .unwrap_or_else(|| NA.to_string()),
        unemployment: unemployment
            .map(|u| format!("{}%", format_number(u.overall_rate, 1)))
            .unwrap_or_else(|| NA.to_string()),
        enterprises: business
            .map(|b| format_int(b.enterprise_overview.total_enterprises))
            .unwrap_or_else(|| NA.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn economic_failure_does_not_abort_report() {
        let input = MunicipalityInput {
            commune: json!({"commune_id": "92094", "commune_name": "Namur"}),
            economics: json!({"business_activity": {"current_data": "broken"}}),
            ..Default::default()
        };
        let report = ReportPipeline::default().assemble(&input, today()).unwrap();
        assert!(report.economic_indicators.is_missing());
        assert!(report.building_development.permits.is_missing());
        assert!(report.building_development.construction_activity.as_ready().is_some());
    }

    #[test]
    fn bad_period_fails_the_municipality() {
        let mut input = MunicipalityInput::default();
        input.data_periods.insert("economic_data".to_string(), "last year".to_string());
        assert!(matches!(
            ReportPipeline::default().assemble(&input, today()),
            Err(ProcessError::InvalidPeriod(_))
        ));
    }

    #[test]
    fn preview_uses_locale_formatting() {
        let input = MunicipalityInput {
            commune: json!({"commune_id": 57081, "commune_name": "Tournai"}),
            building_development: json!({
                "permits_counts": {
                    "current_data": {"total": {"buildings": 1250}},
                    "previous_year_data": {"total": {"buildings": 1000}}
                }
            }),
            economics: json!({
                "unemployment": {"current_data": {"overall_rate": 11.4}},
                "business_activity": {"current_data": {"general": {"total_enterprises": 4321}}}
            }),
            ..Default::default()
        };
        let report = ReportPipeline::default().assemble(&input, today()).unwrap();
        let row = preview_row(&report);
        assert_eq!(row.commune, "Tournai");
        assert_eq!(row.permits, "1.250");
        assert_eq!(row.permits_yoy, "25,0%");
        assert_eq!(row.phase, "Moderate Growth");
        assert_eq!(row.unemployment, "11,4%");
        assert_eq!(row.enterprises, "4.321");
    }
}
