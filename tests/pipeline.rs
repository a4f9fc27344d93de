use chrono::NaiveDate;
use commune_report::loader::parse_municipalities;
use commune_report::{ProcessorConfig, ReportPipeline};
use serde_json::{json, Value};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn municipality() -> Value {
    json!({
        "commune": {
            "commune_id": "21004",
            "commune_name": "Bruxelles",
            "postal_code": "1000",
            "region": "Brussels"
        },
        "data_periods": {"construction_data": "2024-Q2"},
        "building_development": {
            "permits_counts": {
                "current_data": {
                    "residential": {"new_construction": {"buildings": 100, "dwellings": 150}},
                    "non_residential": {"new_construction": {"buildings": 20}}
                }
            }
        },
        "economics": {
            "tax_income": {
                "current_data": {"total_population": 1000, "average_net_income": 22000},
                "previous_year_data": {"average_net_income": 20000}
            },
            "unemployment": {
                "current_data": {
                    "overall_rate": 10.0,
                    "by_age_group": {"YOUNG": {"rate": 18.5}}
                }
            },
            "business_activity": {
                "current_data": {
                    "general": {"total_enterprises": 500},
                    "sectors": {"A": {"enterprises": 40}, "Z": {"enterprises": 3}}
                },
                "previous_year_data": {
                    "sectors": {"A": {"enterprises": 32}}
                }
            }
        }
    })
}

fn build(input: Value) -> Value {
    let (records, load) = parse_municipalities(input);
    assert_eq!(load.parse_errors, 0);
    let pipeline = ReportPipeline::new(ProcessorConfig::default());
    let report = pipeline.assemble(&records[0], today()).unwrap();
    serde_json::to_value(&report).unwrap()
}

#[test]
fn permits_without_previous_year() {
    let report = build(municipality());
    let permits = &report["building_development"]["permits"];

    assert_eq!(permits["counts"]["residential"]["new_construction"]["buildings"], json!(100));
    assert_eq!(permits["counts"]["residential"]["new_construction"]["dwellings"], json!(150));
    assert_eq!(permits["summary"]["total_permits_ytd"], json!(120));
    assert_eq!(permits["summary"]["trend_yoy"], Value::Null);
    assert_eq!(permits["summary"]["residential_ratio"], json!(0.8333));
}

#[test]
fn construction_activity_follows_dwellings() {
    let report = build(municipality());
    let activity = &report["building_development"]["construction_activity"];

    assert_eq!(activity["construction_intensity_index"], json!(1.1));
    assert_eq!(activity["development_phase"], json!("Moderate Growth"));
    assert_eq!(activity["supply_pipeline"]["residential_units_coming"], json!(225));
    assert_eq!(activity["supply_pipeline"]["impact_on_supply"], json!("High"));
    assert_eq!(activity["supply_pipeline"]["estimated_completion_timeframe"], json!("18 months"));
}

#[test]
fn economics_sections_are_populated() {
    let report = build(municipality());
    let econ = &report["economic_indicators"];

    assert_eq!(econ["income_tax"]["income_trends"]["average_income_trend_yoy"], json!(10.0));
    assert_eq!(econ["unemployment"]["by_age_group"]["under_25"]["rate"], json!(18.5));
    assert_eq!(econ["unemployment"]["by_age_group"]["over_50"]["estimated"], json!(true));

    let sectors = econ["business_activity"]["sectors"].as_object().unwrap();
    assert_eq!(sectors.len(), 1);
    assert_eq!(sectors["agriculture"]["trend"], json!("+25.0%"));
    assert_eq!(sectors["agriculture"]["employment_index"], json!(1.35));
}

#[test]
fn metadata_reflects_overrides() {
    let report = build(municipality());
    let meta = &report["metadata"];

    assert_eq!(meta["commune_name"], json!("Bruxelles"));
    assert_eq!(meta["generated_date"], json!("2025-06-02"));
    assert_eq!(meta["data_period"]["construction_data"]["five_year"], json!("2019-Q2"));
    assert_eq!(meta["data_period"]["tax_data"]["current"], json!("2022"));
}

#[test]
fn malformed_economics_is_replaced_by_empty_section() {
    let mut input = municipality();
    input["economics"]["unemployment"]["current_data"] = json!([1, 2, 3]);
    let report = build(input);

    assert_eq!(report["economic_indicators"], json!({}));
    assert_eq!(
        report["building_development"]["permits"]["summary"]["total_permits_ytd"],
        json!(120)
    );
}

#[test]
fn malformed_building_data_degrades() {
    let mut input = municipality();
    input["building_development"]["permits_volume"] = json!({"current_data": 42});
    let report = build(input);

    assert_eq!(
        report["building_development"],
        json!({"permits": {}, "construction_activity": {}})
    );
    assert!(report["economic_indicators"]["unemployment"].is_object());
}

#[test]
fn reports_are_reproducible() {
    let first = serde_json::to_string(&build(municipality())).unwrap();
    let second = serde_json::to_string(&build(municipality())).unwrap();
    assert_eq!(first, second);
}
