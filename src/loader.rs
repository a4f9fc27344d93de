use crate::types::MunicipalityInput;
use serde_json::Value;
use std::error::Error;

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_records: usize,
    pub loaded_records: usize,
    pub parse_errors: usize,
}

/// Load already-extracted municipality records from a JSON file.
///
/// The file holds either one municipality object or an array of them.
/// Records that do not match the expected shape are skipped and counted.
pub fn load_municipalities(path: &str) -> Result<(Vec<MunicipalityInput>, LoadReport), Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let root: Value = serde_json::from_str(&raw)?;
    Ok(parse_municipalities(root))
}

pub fn parse_municipalities(root: Value) -> (Vec<MunicipalityInput>, LoadReport) {
    let items = match root {
        Value::Array(items) => items,
        other => vec![other],
    };
    let total_records = items.len();
    let mut parse_errors = 0usize;
    let mut records = Vec::with_capacity(total_records);

    for item in items {
        if !item.is_object() {
            parse_errors += 1;
            continue;
        }
        match serde_json::from_value::<MunicipalityInput>(item) {
            Ok(r) => records.push(r),
            Err(e) => {
                log::warn!("Skipping municipality record: {}", e);
                parse_errors += 1;
            }
        }
    }

    let report = LoadReport {
        total_records,
        loaded_records: records.len(),
        parse_errors,
    };
    (records, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_single_object_or_array() {
        let (records, report) = parse_municipalities(json!({"commune": {"commune_id": "1"}}));
        assert_eq!(records.len(), 1);
        assert_eq!(report.total_records, 1);

        let (records, report) = parse_municipalities(json!([
            {"commune": {"commune_id": "1"}},
            "not a record",
            {"data_periods": {"tax_data": [2022]}},
            {"economics": {"unemployment": {}}}
        ]));
        assert_eq!(records.len(), 2);
        assert_eq!(report.parse_errors, 2);
        assert_eq!(report.loaded_records, 2);
    }

    #[test]
    fn numeric_periods_are_read_as_years() {
        let (records, report) = parse_municipalities(json!({
            "commune": {"commune_id": "1"},
            "data_periods": {"economic_data": 2023, "tax_data": 2021.0, "construction_data": "2024-Q3"}
        }));
        assert_eq!(report.parse_errors, 0);
        let periods = &records[0].data_periods;
        assert_eq!(periods["economic_data"], "2023");
        assert_eq!(periods["tax_data"], "2021");
        assert_eq!(periods["construction_data"], "2024-Q3");
    }
}
