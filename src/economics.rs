// Economic indicators: income and taxes, unemployment, business activity.
//
// Unlike building development, errors here are returned to the caller, which
// decides how to render a failed section.
use log::{debug, warn};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::config::EconomicsHeuristics;
use crate::error::ProcessError;
use crate::section::{validate_section, Section, SectionCheck};
use crate::types::{
    AgeGroupRate, AgeGroups, BusinessActivity, EconomicIndicators, EnterpriseOverview,
    EnterpriseSize, ForeignInvestment, IncomeDistribution, IncomeOverview, IncomeSources,
    IncomeTax, IncomeTrends, SectorActivity, TaxBurden, Unemployment,
};
use crate::util::{
    calculate_change, count_at, format_signed_percentage, is_numeric_and_greater_than,
    num_at, round_to, AsNumeric,
};

/// NACE level-1 letter codes and the canonical sector names reported for them.
pub static MAIN_SECTORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("A", "agriculture"),
        ("C", "manufacturing"),
        ("F", "construction"),
        ("G", "retail"),
        ("H", "transportation"),
        ("I", "hospitality"),
        ("J", "it_communication"),
        ("K", "finance"),
        ("L", "real_estate"),
        ("M", "professional"),
        ("N", "administrative"),
        ("O", "public_admin"),
        ("P", "education"),
        ("Q", "health_social"),
        ("R", "arts_entertainment"),
        ("S", "other_services"),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBracket {
    Under25,
    From25To50,
    Over50,
}

/// Every source spelling of an age bracket, most preferred first.
const AGE_BRACKET_ALIASES: [(AgeBracket, [&str; 4]); 3] = [
    (AgeBracket::Under25, ["15-24", "15_24", "AGE_15_24", "YOUNG"]),
    (AgeBracket::From25To50, ["25-49", "25_49", "AGE_25_49", "ADULT"]),
    (AgeBracket::Over50, ["50+", "50_PLUS", "AGE_50_PLUS", "SENIOR"]),
];

// alias -> (bracket, preference rank)
static AGE_ALIASES: Lazy<HashMap<&'static str, (AgeBracket, usize)>> = Lazy::new(|| {
    AGE_BRACKET_ALIASES
        .iter()
        .flat_map(|(bracket, aliases)| {
            aliases
                .iter()
                .enumerate()
                .map(move |(rank, alias)| (*alias, (*bracket, rank)))
        })
        .collect()
});

/// Map a record's `by_age_group` entries onto canonical brackets.
///
/// Keys are matched case-insensitively. When a record spells the same
/// bracket several ways, the most preferred alias wins.
pub fn normalize_age_groups(by_age_group: Option<&Value>) -> HashMap<AgeBracket, &Value> {
    let mut resolved: HashMap<AgeBracket, (usize, &Value)> = HashMap::new();
    let Some(groups) = by_age_group.and_then(Value::as_object) else {
        return HashMap::new();
    };
    for (key, entry) in groups {
        let Some(&(bracket, rank)) = AGE_ALIASES.get(key.trim().to_ascii_uppercase().as_str())
        else {
            debug!("Ignoring unknown age group `{}`", key);
            continue;
        };
        let preferred = resolved.get(&bracket).map_or(true, |(best, _)| rank < *best);
        if preferred {
            resolved.insert(bracket, (rank, entry));
        }
    }
    resolved
        .into_iter()
        .map(|(bracket, (_, entry))| (bracket, entry))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeBucket {
    Micro,
    Small,
    Medium,
    Large,
}

impl SizeBucket {
    fn for_upper_bound(max_employees: Option<f64>) -> Self {
        match max_employees {
            Some(m) if m <= 9.0 => SizeBucket::Micro,
            Some(m) if m <= 49.0 => SizeBucket::Small,
            Some(m) if m <= 249.0 => SizeBucket::Medium,
            _ => SizeBucket::Large,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Upper employee bound encoded in a bracket key such as `10-49` or
/// `SIZE_50_249`. Open-ended keys (`250+`) and unparseable ones give `None`.
fn bracket_upper_bound(code: &str) -> Option<f64> {
    let bounds: Vec<f64> = code
        .split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .filter_map(|part| part.parse().ok())
        .collect();
    if bounds.len() >= 2 {
        bounds.last().copied()
    } else {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct EconomicsProcessor {
    heuristics: EconomicsHeuristics,
}

impl EconomicsProcessor {
    pub fn new(heuristics: EconomicsHeuristics) -> Self {
        Self { heuristics }
    }

    /// Build the `economic_indicators` section. Errors from any sub-section
    /// are propagated.
    pub fn process_data(&self, data: &Value) -> Result<EconomicIndicators, ProcessError> {
        Ok(EconomicIndicators {
            income_tax: self.process_income_tax(data.get("tax_income"))?,
            unemployment: self.process_unemployment(data.get("unemployment"))?,
            business_activity: self.process_business_activity(data.get("business_activity"))?,
        })
    }

    pub fn process_income_tax(&self, data: Option<&Value>) -> Result<Section<IncomeTax>, ProcessError> {
        let record = match validate_section(data, "tax_income")? {
            SectionCheck::Present(record) => record,
            SectionCheck::Missing => {
                warn!("Income tax data missing or incomplete");
                return Ok(Section::Missing);
            }
        };
        let current = record.current;
        let categories = &self.heuristics.income_categories;
        let average_income = num_at(current, &["average_net_income"]);

        let previous_average = record.previous.and_then(|p| p.get("average_net_income"));
        let five_year_average = record.five_year.and_then(|p| p.get("average_net_income"));

        Ok(Section::Ready(IncomeTax {
            income_overview: IncomeOverview {
                total_population: count_at(current, &["total_population"]),
                total_net_income: num_at(current, &["total_net_income"]),
                total_taxable_income: num_at(current, &["total_taxable_income"]),
                average_income,
                median_income: num_at(current, &["average_taxable_income"]),
                income_distribution: IncomeDistribution {
                    low_income_pct: round_to(categories.low_income * 100.0, 1),
                    middle_income_pct: round_to(categories.middle_income * 100.0, 1),
                    high_income_pct: round_to(categories.high_income * 100.0, 1),
                },
            },
            tax_burden: TaxBurden {
                average_tax_rate: num_at(current, &["average_tax_burden_percentage"]),
                municipal_tax_rate: num_at(current, &["tax_types", "municipal", "percentage"]),
            },
            income_sources: IncomeSources {
                professional_income_pct: num_at(current, &["income_sources", "professional", "percentage"]),
                real_estate_income_pct: num_at(current, &["income_sources", "real_estate", "percentage"]),
                investment_income_pct: num_at(current, &["income_sources", "movable_assets", "percentage"]),
                other_income_pct: num_at(current, &["income_sources", "various", "percentage"]),
            },
            income_trends: IncomeTrends {
                average_income_trend_yoy: calculate_change(average_income, previous_average).percentage,
                average_income_trend_5y: calculate_change(average_income, five_year_average).percentage,
            },
        }))
    }

    /// Overall unemployment and the three canonical age brackets.
    ///
    /// A bracket the source does not report is estimated from the overall
    /// rate and flagged as such; its trend is left unavailable.
    pub fn process_unemployment(
        &self,
        data: Option<&Value>,
    ) -> Result<Section<Unemployment>, ProcessError> {
        let record = match validate_section(data, "unemployment")? {
            SectionCheck::Present(record) => record,
            SectionCheck::Missing => {
                warn!("Unemployment data missing or incomplete");
                return Ok(Section::Missing);
            }
        };
        let overall_rate = num_at(record.current, &["overall_rate"]);
        let trend_yoy = record
            .previous
            .and_then(|p| p.get("overall_rate"))
            .as_numeric()
            .filter(|prev| *prev != 0.0)
            .map(|prev| round_to(overall_rate - prev, 2));

        let current_groups = normalize_age_groups(record.current.get("by_age_group"));
        let previous_groups =
            normalize_age_groups(record.previous.and_then(|p| p.get("by_age_group")));

        let proxy = &self.heuristics.age_proxy;
        let bracket_rate = |bracket: AgeBracket, multiplier: f64| match current_groups.get(&bracket) {
            Some(entry) => {
                let rate = num_at(entry, &["rate"]);
                AgeGroupRate {
                    rate,
                    trend: previous_groups
                        .get(&bracket)
                        .map(|prev| round_to(rate - num_at(prev, &["rate"]), 2)),
                    estimated: false,
                }
            }
            None => AgeGroupRate {
                rate: round_to(overall_rate * multiplier, 2),
                trend: None,
                estimated: true,
            },
        };

        Ok(Section::Ready(Unemployment {
            overall_rate,
            trend_yoy,
            by_age_group: AgeGroups {
                under_25: bracket_rate(AgeBracket::Under25, proxy.under_25),
                from_25_to_50: bracket_rate(AgeBracket::From25To50, proxy.from_25_to_50),
                over_50: bracket_rate(AgeBracket::Over50, proxy.over_50),
            },
        }))
    }

    pub fn process_business_activity(
        &self,
        data: Option<&Value>,
    ) -> Result<Section<BusinessActivity>, ProcessError> {
        let record = match validate_section(data, "business_activity")? {
            SectionCheck::Present(record) => record,
            SectionCheck::Missing => {
                warn!("Business activity data missing or incomplete");
                return Ok(Section::Missing);
            }
        };
        let current = record.current;

        let enterprise_overview = EnterpriseOverview {
            total_enterprises: count_at(current, &["general", "total_enterprises"]),
            total_starts: count_at(current, &["general", "total_starts"]),
            total_stops: count_at(current, &["general", "total_stops"]),
            net_creation: count_at(current, &["general", "net_creation"]),
            creation_rate: num_at(current, &["general", "creation_rate"]),
            closure_rate: num_at(current, &["general", "closure_rate"]),
        };

        Ok(Section::Ready(BusinessActivity {
            enterprise_overview,
            sectors: self.process_sectors(current.get("sectors"), record.previous),
            enterprise_size: enterprise_size(current.get("by_size")),
            foreign_investment: foreign_investment(current),
        }))
    }

    fn process_sectors(
        &self,
        sectors: Option<&Value>,
        previous: Option<&Value>,
    ) -> BTreeMap<String, SectorActivity> {
        let previous = sector_counts(previous.and_then(|p| p.get("sectors")));
        sector_counts(sectors)
            .into_iter()
            .map(|(name, enterprises)| {
                let previous_enterprises = previous.get(name).copied();
                let trend = if is_numeric_and_greater_than(previous_enterprises, 0.0) {
                    Some(calculate_change(enterprises, previous_enterprises))
                } else {
                    None
                };
                let activity = SectorActivity {
                    enterprise_count: enterprises,
                    employment_index: self.employment_index(name, trend.as_ref().and_then(|t| t.percentage)),
                    trend: trend.map(|t| t.formatted),
                };
                (name.to_string(), activity)
            })
            .collect()
    }

    fn employment_index(&self, sector: &str, trend_pct: Option<f64>) -> f64 {
        let weights = &self.heuristics.employment;
        let mut index = if weights.neutral_sectors.iter().any(|s| s == sector) {
            weights.neutral_weight
        } else if weights.high_sectors.iter().any(|s| s == sector) {
            weights.high_weight
        } else {
            weights.default_weight
        };
        if let Some(pct) = trend_pct {
            index *= 1.0 + pct * weights.trend_weight / 100.0;
        }
        round_to(index.max(0.0), 2)
    }
}

/// Enterprise counts keyed by canonical sector name.
///
/// NACE keys are matched after trimming and upper-casing. If a record spells
/// one code several ways, the exact upper-case key is kept.
fn sector_counts(sectors: Option<&Value>) -> BTreeMap<&'static str, i64> {
    let mut resolved: BTreeMap<&'static str, (bool, i64)> = BTreeMap::new();
    let Some(sectors) = sectors.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    for (key, entry) in sectors {
        let code = key.trim().to_ascii_uppercase();
        let Some(&name) = MAIN_SECTORS.get(code.as_str()) else {
            debug!("Dropping unmapped NACE code `{}`", key);
            continue;
        };
        let exact = *key == code;
        let keep = resolved.get(name).map_or(true, |(was_exact, _)| exact && !*was_exact);
        if keep {
            resolved.insert(name, (exact, count_at(entry, &["enterprises"])));
        }
    }
    resolved
        .into_iter()
        .map(|(name, (_, count))| (name, count))
        .collect()
}

/// Share of enterprises per size class.
///
/// Raw `enterprises` counts are accumulated per class and turned into
/// percentages of their total; sources that only report `percentage` are
/// summed as-is.
fn enterprise_size(by_size: Option<&Value>) -> EnterpriseSize {
    let mut counts = [0.0_f64; 4];
    let mut reported_pct = [0.0_f64; 4];
    let mut has_counts = false;

    if let Some(entries) = by_size.and_then(Value::as_object) {
        for (code, entry) in entries {
            let upper = entry
                .get("max_employees")
                .as_numeric()
                .or_else(|| bracket_upper_bound(code));
            let bucket = SizeBucket::for_upper_bound(upper).index();
            if let Some(n) = entry.get("enterprises").as_numeric() {
                counts[bucket] += n;
                has_counts = true;
            }
            reported_pct[bucket] += num_at(entry, &["percentage"]);
        }
    }

    let total: f64 = counts.iter().sum();
    let shares = if has_counts && total > 0.0 {
        counts.map(|c| round_to(c / total * 100.0, 1))
    } else {
        reported_pct.map(|p| round_to(p, 1))
    };
    EnterpriseSize {
        micro_enterprises_pct: shares[SizeBucket::Micro.index()],
        small_enterprises_pct: shares[SizeBucket::Small.index()],
        medium_enterprises_pct: shares[SizeBucket::Medium.index()],
        large_enterprises_pct: shares[SizeBucket::Large.index()],
    }
}

fn foreign_investment(current: &Value) -> ForeignInvestment {
    let count = count_at(current, &["foreign", "enterprises"]);
    let starts = count_at(current, &["foreign", "starts"]);
    let stops = count_at(current, &["foreign", "stops"]);
    let growth = if is_numeric_and_greater_than(count, 0.0) {
        let pct = (starts as f64 - stops as f64) / count as f64 * 100.0;
        format_signed_percentage(round_to(pct, 1))
    } else {
        format_signed_percentage(0.0)
    };
    ForeignInvestment {
        foreign_enterprises_count: count,
        foreign_starts: starts,
        foreign_stops: stops,
        foreign_investment_growth: growth,
    }
}
