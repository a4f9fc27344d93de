// Period-record validation shared by every processor, plus the `Section`
// wrapper that lets a missing section serialize as `{}` instead of `null`.
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::ProcessError;

/// A report section that is either fully computed or missing.
///
/// `Missing` serializes as an empty JSON object so downstream consumers see
/// the same container type whether or not the input was available.
#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    Ready(T),
    Missing,
}

impl<T> Section<T> {
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Section::Ready(v) => Some(v),
            Section::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Section::Missing)
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Section::Ready(v) => v.serialize(serializer),
            Section::Missing => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// The periods of one validated input record.
///
/// `current` is guaranteed to be a JSON object. `previous` and `five_year`
/// are only kept when they are objects too.
#[derive(Debug, Clone, Copy)]
pub struct PeriodRecord<'a> {
    pub current: &'a Value,
    pub previous: Option<&'a Value>,
    pub five_year: Option<&'a Value>,
}

/// Outcome of [`validate_section`].
#[derive(Debug, Clone, Copy)]
pub enum SectionCheck<'a> {
    Present(PeriodRecord<'a>),
    Missing,
}

/// Check that `data` carries a usable `current_data` mapping.
///
/// Absent or falsy `current_data` is [`SectionCheck::Missing`]; a truthy
/// value that is not an object is a [`ProcessError::MalformedSection`].
pub fn validate_section<'a>(
    data: Option<&'a Value>,
    section: &'static str,
) -> Result<SectionCheck<'a>, ProcessError> {
    let Some(data) = data else {
        return Ok(SectionCheck::Missing);
    };
    let current = match data.get("current_data") {
        Some(v) if is_truthy(v) => v,
        _ => return Ok(SectionCheck::Missing),
    };
    if !current.is_object() {
        return Err(ProcessError::MalformedSection {
            section,
            found: type_name(current),
        });
    }
    Ok(SectionCheck::Present(PeriodRecord {
        current,
        previous: data.get("previous_year_data").filter(|v| v.is_object()),
        five_year: data.get("five_year_data").and_then(oldest_entry),
    }))
}

// Series are stored oldest first; a bare object is the five-year-back period itself.
fn oldest_entry(v: &Value) -> Option<&Value> {
    match v {
        Value::Object(_) => Some(v),
        Value::Array(items) => items.first().filter(|i| i.is_object()),
        _ => None,
    }
}

/// JSON truthiness: `null`, `false`, `0`, `""`, `[]` and `{}` are all falsy.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falsy_current_data_is_missing() {
        for data in [json!({}), json!({"current_data": {}}), json!({"current_data": null})] {
            assert!(matches!(
                validate_section(Some(&data), "test"),
                Ok(SectionCheck::Missing)
            ));
        }
        assert!(matches!(validate_section(None, "test"), Ok(SectionCheck::Missing)));
    }

    #[test]
    fn non_object_current_data_is_malformed() {
        let data = json!({"current_data": [1, 2]});
        let err = validate_section(Some(&data), "permits_counts").unwrap_err();
        assert!(matches!(
            err,
            ProcessError::MalformedSection { section: "permits_counts", found: "array" }
        ));
    }

    #[test]
    fn five_year_series_uses_oldest_entry() {
        let data = json!({
            "current_data": {"x": 1},
            "previous_year_data": "not an object",
            "five_year_data": [{"x": 5}, {"x": 6}]
        });
        let SectionCheck::Present(record) = validate_section(Some(&data), "t").unwrap() else {
            panic!("expected present section");
        };
        assert!(record.previous.is_none());
        assert_eq!(record.five_year, Some(&json!({"x": 5})));
    }

    #[test]
    fn missing_section_serializes_as_empty_object() {
        let s: Section<u32> = Section::Missing;
        assert_eq!(serde_json::to_string(&s).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&Section::Ready(3)).unwrap(), "3");
    }
}
