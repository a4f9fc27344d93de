use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::metadata::ReportMetadata;
use crate::section::Section;

/// One municipality as handed over by the extraction layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MunicipalityInput {
    pub commune: Value,
    #[serde(deserialize_with = "period_labels")]
    pub data_periods: BTreeMap<String, String>,
    pub building_development: Value,
    pub economics: Value,
    pub real_estate: Option<Value>,
}

/// Period labels arrive either as text (`"2024-Q1"`) or as bare years (`2023`).
fn period_labels<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, Value>::deserialize(deserializer)?
        .into_iter()
        .map(|(dataset, period)| {
            let label = match &period {
                Value::String(s) => s.clone(),
                Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                    (Some(year), _) => year.to_string(),
                    (None, Some(year)) if year.fract() == 0.0 => format!("{}", year as i64),
                    _ => {
                        return Err(<D::Error as de::Error>::custom(format!(
                            "period for `{}` is not a whole year: {}",
                            dataset, n
                        )))
                    }
                },
                other => {
                    return Err(<D::Error as de::Error>::custom(format!(
                        "period for `{}` must be text or a year, found {}",
                        dataset, other
                    )))
                }
            };
            Ok((dataset, label))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Building development
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingDevelopment {
    pub permits: Section<PermitsSection>,
    pub construction_activity: Section<ConstructionActivity>,
}

impl BuildingDevelopment {
    /// Shape returned when aggregation fails: both sections present but empty.
    pub fn degraded() -> Self {
        BuildingDevelopment {
            permits: Section::Missing,
            construction_activity: Section::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitsSection {
    pub summary: PermitsSummary,
    pub counts: PermitsCounts,
    pub surface: PermitsSurface,
    pub volume: PermitsVolume,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitsSummary {
    pub total_permits_ytd: i64,
    /// Percent change of total permits versus the previous year.
    pub trend_yoy: Option<f64>,
    /// Residential share of all permits; `None` when there are no permits.
    pub residential_ratio: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PermitsCounts {
    pub residential: ResidentialCounts,
    pub non_residential: NonResidentialCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResidentialCounts {
    pub new_construction: NewDwellingCounts,
    pub renovation: DwellingCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewDwellingCounts {
    pub buildings: i64,
    pub dwellings: i64,
    pub houses: i64,
    pub apartments: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DwellingCounts {
    pub buildings: i64,
    pub dwellings: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NonResidentialCounts {
    pub new_construction: BuildingCount,
    pub renovation: BuildingCount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildingCount {
    pub buildings: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitsSurface {
    pub residential_new_construction_sqm: f64,
    pub avg_dwelling_size_sqm: f64,
    pub trend_yoy: Option<f64>,
    /// `true` when `trend_yoy` was derived from dwelling counts.
    pub trend_estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitsVolume {
    pub non_residential_new_construction_cubic_m: f64,
    pub trend_yoy: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevelopmentPhase {
    StrongGrowth,
    ModerateGrowth,
    Stable,
    Stagnation,
    Slowdown,
}

impl DevelopmentPhase {
    pub const ALL: [DevelopmentPhase; 5] = [
        DevelopmentPhase::StrongGrowth,
        DevelopmentPhase::ModerateGrowth,
        DevelopmentPhase::Stable,
        DevelopmentPhase::Stagnation,
        DevelopmentPhase::Slowdown,
    ];

    /// Display name, also used as the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            DevelopmentPhase::StrongGrowth => "Strong Growth",
            DevelopmentPhase::ModerateGrowth => "Moderate Growth",
            DevelopmentPhase::Stable => "Stable",
            DevelopmentPhase::Stagnation => "Stagnation",
            DevelopmentPhase::Slowdown => "Slowdown",
        }
    }
}

impl Serialize for DevelopmentPhase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SupplyImpact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructionActivity {
    pub construction_intensity_index: f64,
    pub development_phase: DevelopmentPhase,
    pub supply_pipeline: SupplyPipeline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplyPipeline {
    pub residential_units_coming: i64,
    pub estimated_completion_timeframe: String,
    pub impact_on_supply: SupplyImpact,
}

// ---------------------------------------------------------------------------
// Economics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EconomicIndicators {
    pub income_tax: Section<IncomeTax>,
    pub unemployment: Section<Unemployment>,
    pub business_activity: Section<BusinessActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeTax {
    pub income_overview: IncomeOverview,
    pub tax_burden: TaxBurden,
    pub income_sources: IncomeSources,
    pub income_trends: IncomeTrends,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeOverview {
    pub total_population: i64,
    pub total_net_income: f64,
    pub total_taxable_income: f64,
    pub average_income: f64,
    /// Approximated by the average taxable income.
    pub median_income: f64,
    pub income_distribution: IncomeDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeDistribution {
    pub low_income_pct: f64,
    pub middle_income_pct: f64,
    pub high_income_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxBurden {
    pub average_tax_rate: f64,
    pub municipal_tax_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSources {
    pub professional_income_pct: f64,
    pub real_estate_income_pct: f64,
    pub investment_income_pct: f64,
    pub other_income_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeTrends {
    pub average_income_trend_yoy: Option<f64>,
    pub average_income_trend_5y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unemployment {
    pub overall_rate: f64,
    /// Percentage-point change versus the previous year.
    pub trend_yoy: Option<f64>,
    pub by_age_group: AgeGroups,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeGroups {
    pub under_25: AgeGroupRate,
    #[serde(rename = "25_to_50")]
    pub from_25_to_50: AgeGroupRate,
    pub over_50: AgeGroupRate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeGroupRate {
    pub rate: f64,
    pub trend: Option<f64>,
    /// `true` when the rate is a proxy derived from the overall rate.
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessActivity {
    pub enterprise_overview: EnterpriseOverview,
    pub sectors: BTreeMap<String, SectorActivity>,
    pub enterprise_size: EnterpriseSize,
    pub foreign_investment: ForeignInvestment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnterpriseOverview {
    pub total_enterprises: i64,
    pub total_starts: i64,
    pub total_stops: i64,
    pub net_creation: i64,
    pub creation_rate: f64,
    pub closure_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorActivity {
    pub enterprise_count: i64,
    /// Signed YoY label such as `+4.2%`.
    pub trend: Option<String>,
    pub employment_index: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnterpriseSize {
    pub micro_enterprises_pct: f64,
    pub small_enterprises_pct: f64,
    pub medium_enterprises_pct: f64,
    pub large_enterprises_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForeignInvestment {
    pub foreign_enterprises_count: i64,
    pub foreign_starts: i64,
    pub foreign_stops: i64,
    pub foreign_investment_growth: String,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MunicipalityReport {
    pub metadata: ReportMetadata,
    pub building_development: BuildingDevelopment,
    pub economic_indicators: Section<EconomicIndicators>,
}

/// One line of the console preview.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ReportPreviewRow {
    #[tabled(rename = "Commune")]
    pub commune: String,
    #[tabled(rename = "Permits")]
    pub permits: String,
    #[tabled(rename = "PermitsYoY")]
    pub permits_yoy: String,
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[tabled(rename = "Unemployment")]
    pub unemployment: String,
    #[tabled(rename = "Enterprises")]
    pub enterprises: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_as_its_label() {
        for phase in DevelopmentPhase::ALL {
            assert_eq!(serde_json::to_value(phase).unwrap(), phase.label());
        }
        assert_eq!(
            serde_json::to_string(&DevelopmentPhase::ModerateGrowth).unwrap(),
            r#""Moderate Growth""#
        );
    }
}
