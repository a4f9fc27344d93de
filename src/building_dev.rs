// Building development: permit counts, surfaces and volumes, plus the
// construction intensity index derived from them.
use log::{debug, error, warn};
use serde_json::Value;

use crate::config::ConstructionHeuristics;
use crate::error::ProcessError;
use crate::section::{validate_section, Section, SectionCheck};
use crate::types::{
    BuildingCount, BuildingDevelopment, ConstructionActivity, DevelopmentPhase, DwellingCounts,
    NewDwellingCounts, NonResidentialCounts, PermitsCounts, PermitsSection, PermitsSummary,
    PermitsSurface, PermitsVolume, ResidentialCounts, SupplyImpact, SupplyPipeline,
};
use crate::util::{
    calculate_avg, calculate_change, count_at, is_numeric_and_greater_than,
    is_numeric_and_less_than, lookup, num_at, round_to, AsNumeric,
};

// Stand-in for an absent surface/volume period so lookups default to zero.
static NO_DATA: Value = Value::Null;

const NEW_RESIDENTIAL_DWELLINGS: &[&str] = &["residential", "new_construction", "dwellings"];

#[derive(Debug, Clone, Default)]
pub struct BuildingDevProcessor {
    heuristics: ConstructionHeuristics,
}

impl BuildingDevProcessor {
    pub fn new(heuristics: ConstructionHeuristics) -> Self {
        Self { heuristics }
    }

    /// Build the `building_development` section from the raw permit datasets.
    ///
    /// Never fails: any error is logged and replaced by an empty-but-shaped
    /// result. `real_estate_data` is accepted so every domain can be driven
    /// the same way; the index currently depends on permits alone.
    pub fn process_data(
        &self,
        data: &Value,
        real_estate_data: Option<&Value>,
    ) -> BuildingDevelopment {
        match self.try_process_data(data, real_estate_data) {
            Ok(result) => result,
            Err(e) => {
                error!("Building development processing failed: {}", e);
                BuildingDevelopment::degraded()
            }
        }
    }

    fn try_process_data(
        &self,
        data: &Value,
        real_estate_data: Option<&Value>,
    ) -> Result<BuildingDevelopment, ProcessError> {
        let permits = self.process_permits(
            data.get("permits_counts"),
            data.get("permits_surface"),
            data.get("permits_volume"),
        )?;
        let construction_activity = self.process_construction_activity(&permits, real_estate_data);
        Ok(BuildingDevelopment {
            permits,
            construction_activity: Section::Ready(construction_activity),
        })
    }

    /// Permits section: summary, detailed counts, surface and volume.
    ///
    /// Returns [`Section::Missing`] (with a warning) when the counts dataset
    /// has no `current_data`.
    pub fn process_permits(
        &self,
        counts_data: Option<&Value>,
        surface_data: Option<&Value>,
        volume_data: Option<&Value>,
    ) -> Result<Section<PermitsSection>, ProcessError> {
        let counts = match validate_section(counts_data, "permits_counts")? {
            SectionCheck::Present(record) => record,
            SectionCheck::Missing => {
                warn!("Permit count data missing or incomplete");
                return Ok(Section::Missing);
            }
        };
        let (current_surface, previous_surface) = periods(surface_data, "permits_surface")?;
        let (current_volume, previous_volume) = periods(volume_data, "permits_volume")?;

        Ok(Section::Ready(PermitsSection {
            summary: self.process_permits_summary(counts.current, counts.previous),
            counts: self.process_permits_counts(counts.current),
            surface: self.process_permits_surface(
                current_surface,
                previous_surface,
                counts.current,
                counts.previous,
            ),
            volume: self.process_permits_volume(current_volume, previous_volume),
        }))
    }

    pub fn process_permits_summary(
        &self,
        current: &Value,
        previous: Option<&Value>,
    ) -> PermitsSummary {
        let total = total_buildings(current);
        let previous_total = previous.map(total_buildings);
        let trend = calculate_change(total, previous_total);

        let residential = count_at(current, &["residential", "new_construction", "buildings"])
            .saturating_add(count_at(current, &["residential", "renovation", "buildings"]));
        let residential_ratio = if is_numeric_and_greater_than(total, 0.0) {
            Some(round_to(residential as f64 / total as f64, 4))
        } else {
            None
        };

        PermitsSummary {
            total_permits_ytd: total,
            trend_yoy: trend.percentage,
            residential_ratio,
        }
    }

    pub fn process_permits_counts(&self, current: &Value) -> PermitsCounts {
        let res_new = lookup(current, &["residential", "new_construction"]).unwrap_or(&NO_DATA);
        let res_reno = lookup(current, &["residential", "renovation"]).unwrap_or(&NO_DATA);
        PermitsCounts {
            residential: ResidentialCounts {
                new_construction: NewDwellingCounts {
                    buildings: count_at(res_new, &["buildings"]),
                    dwellings: count_at(res_new, &["dwellings"]),
                    houses: count_at(res_new, &["houses"]),
                    apartments: count_at(res_new, &["apartments"]),
                },
                renovation: DwellingCounts {
                    buildings: count_at(res_reno, &["buildings"]),
                    dwellings: count_at(res_reno, &["dwellings"]),
                },
            },
            non_residential: NonResidentialCounts {
                new_construction: BuildingCount {
                    buildings: count_at(current, &["non_residential", "new_construction", "buildings"]),
                },
                renovation: BuildingCount {
                    buildings: count_at(current, &["non_residential", "renovation", "buildings"]),
                },
            },
        }
    }

    /// Residential surface metrics.
    ///
    /// When the surface dataset has no usable previous-year value, the trend
    /// is estimated from the change in new residential dwellings instead.
    pub fn process_permits_surface(
        &self,
        current: &Value,
        previous: Option<&Value>,
        current_counts: &Value,
        previous_counts: Option<&Value>,
    ) -> PermitsSurface {
        let total_surface = num_at(current, &["total_surface_m2"]);
        let dwellings = count_at(current_counts, NEW_RESIDENTIAL_DWELLINGS);

        let mut avg_dwelling_size = num_at(current, &["avg_surface_per_dwelling_m2"]);
        if avg_dwelling_size == 0.0 && is_numeric_and_greater_than(dwellings, 0.0) {
            avg_dwelling_size = calculate_avg(total_surface, dwellings as f64)
                .map(|v| round_to(v, 2))
                .unwrap_or(0.0);
        }

        let reported = calculate_change(
            total_surface,
            previous.and_then(|p| lookup(p, &["total_surface_m2"])),
        );
        let (trend_yoy, trend_estimated) = match reported.percentage {
            Some(pct) => (Some(pct), false),
            None => {
                let previous_dwellings = previous_counts.map(|p| count_at(p, NEW_RESIDENTIAL_DWELLINGS));
                if is_numeric_and_greater_than(previous_dwellings, 0.0) {
                    debug!("Surface trend unavailable, estimating from dwelling counts");
                    let proxy = calculate_change(dwellings, previous_dwellings);
                    (proxy.percentage, proxy.percentage.is_some())
                } else {
                    (None, false)
                }
            }
        };

        PermitsSurface {
            residential_new_construction_sqm: total_surface,
            avg_dwelling_size_sqm: avg_dwelling_size,
            trend_yoy,
            trend_estimated,
        }
    }

    pub fn process_permits_volume(&self, current: &Value, previous: Option<&Value>) -> PermitsVolume {
        let total_volume = num_at(current, &["total_volume_m3"]);
        let trend = calculate_change(
            total_volume,
            previous.and_then(|p| lookup(p, &["total_volume_m3"])),
        );
        PermitsVolume {
            non_residential_new_construction_cubic_m: total_volume,
            trend_yoy: trend.percentage,
        }
    }

    /// Heuristic construction momentum and the resulting supply outlook.
    pub fn process_construction_activity(
        &self,
        permits: &Section<PermitsSection>,
        _real_estate_data: Option<&Value>,
    ) -> ConstructionActivity {
        let h = &self.heuristics;
        let mut index = h.baseline_index;
        let mut dwellings = 0;

        if let Section::Ready(p) = permits {
            let permit_trend = p.summary.trend_yoy;
            if is_numeric_and_greater_than(permit_trend, h.permit_trend_strong) {
                index *= h.strong_growth_multiplier;
            } else if is_numeric_and_greater_than(permit_trend, h.permit_trend_moderate) {
                index *= h.moderate_growth_multiplier;
            } else if is_numeric_and_less_than(permit_trend, -h.permit_trend_strong) {
                index *= h.strong_decline_multiplier;
            } else if is_numeric_and_less_than(permit_trend, -h.permit_trend_moderate) {
                index *= h.moderate_decline_multiplier;
            }

            let surface_trend = p.surface.trend_yoy;
            if is_numeric_and_greater_than(surface_trend, h.surface_trend_strong) {
                index += h.surface_strong_bump;
            } else if is_numeric_and_greater_than(surface_trend, h.surface_trend_moderate) {
                index += h.surface_moderate_bump;
            } else if is_numeric_and_less_than(surface_trend, -h.surface_trend_strong) {
                index -= h.surface_strong_bump;
            } else if is_numeric_and_less_than(surface_trend, -h.surface_trend_moderate) {
                index -= h.surface_moderate_bump;
            }

            dwellings = p.counts.residential.new_construction.dwellings;
            if is_numeric_and_greater_than(dwellings, h.dwellings_strong) {
                index += h.dwellings_strong_bump;
            } else if is_numeric_and_greater_than(dwellings, h.dwellings_moderate) {
                index += h.dwellings_moderate_bump;
            }
        }

        let index = round_to(index, 2);
        let units_coming = (dwellings as f64 * h.pipeline_multiplier).round() as i64;

        ConstructionActivity {
            construction_intensity_index: index,
            development_phase: self.classify_phase(index),
            supply_pipeline: SupplyPipeline {
                residential_units_coming: units_coming,
                estimated_completion_timeframe: h.completion_timeframe.clone(),
                impact_on_supply: self.classify_supply_impact(units_coming),
            },
        }
    }

    fn classify_phase(&self, index: f64) -> DevelopmentPhase {
        let h = &self.heuristics;
        if index > h.strong_growth_above {
            DevelopmentPhase::StrongGrowth
        } else if index > h.moderate_growth_above {
            DevelopmentPhase::ModerateGrowth
        } else if index < h.slowdown_below {
            DevelopmentPhase::Slowdown
        } else if index < h.stagnation_below {
            DevelopmentPhase::Stagnation
        } else {
            DevelopmentPhase::Stable
        }
    }

    fn classify_supply_impact(&self, units: i64) -> SupplyImpact {
        let units = units as f64;
        if units > self.heuristics.high_impact_units {
            SupplyImpact::High
        } else if units < self.heuristics.low_impact_units {
            SupplyImpact::Low
        } else {
            SupplyImpact::Medium
        }
    }
}

/// Current and previous periods of an optional dataset; absent data reads as zeros.
fn periods<'a>(
    data: Option<&'a Value>,
    section: &'static str,
) -> Result<(&'a Value, Option<&'a Value>), ProcessError> {
    Ok(match validate_section(data, section)? {
        SectionCheck::Present(record) => (record.current, record.previous),
        SectionCheck::Missing => (&NO_DATA, None),
    })
}

// `total.buildings` when reported, otherwise the sum of the four categories.
// Counts saturate rather than overflow on absurd inputs.
fn total_buildings(record: &Value) -> i64 {
    match lookup(record, &["total", "buildings"]).as_numeric() {
        Some(total) => total.round() as i64,
        None => [
            &["residential", "new_construction", "buildings"][..],
            &["residential", "renovation", "buildings"][..],
            &["non_residential", "new_construction", "buildings"][..],
            &["non_residential", "renovation", "buildings"][..],
        ]
        .iter()
        .map(|path| count_at(record, path))
        .fold(0_i64, i64::saturating_add),
    }
}
