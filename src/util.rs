// Utility helpers for numeric coercion, year-over-year changes and formatting.
//
// This module centralizes all the "dirty" JSON/number handling so the
// processors can treat every leaf as either a clean `f64` or "not available".
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Marker used when a trend cannot be computed.
pub const TREND_UNAVAILABLE: &str = "N/A";

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in database exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Anything that may or may not hold a usable number.
///
/// Implemented for raw JSON values as well as the plain numeric types the
/// processors compute, so the comparison guards accept both.
pub trait AsNumeric {
    fn as_numeric(&self) -> Option<f64>;
}

impl AsNumeric for Value {
    fn as_numeric(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_f64_safe(Some(s)),
            _ => None,
        };
        n.filter(|v| v.is_finite())
    }
}

impl AsNumeric for f64 {
    fn as_numeric(&self) -> Option<f64> {
        Some(*self).filter(|v| v.is_finite())
    }
}

impl AsNumeric for i64 {
    fn as_numeric(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl<T: AsNumeric> AsNumeric for Option<T> {
    fn as_numeric(&self) -> Option<f64> {
        self.as_ref().and_then(AsNumeric::as_numeric)
    }
}

impl<T: AsNumeric + ?Sized> AsNumeric for &T {
    fn as_numeric(&self) -> Option<f64> {
        (**self).as_numeric()
    }
}

/// Walk a chain of object keys, returning `None` as soon as a key is missing
/// or an intermediate value is not an object.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// Numeric leaf at `path`, or `0.0` when absent/non-numeric.
pub fn num_at(root: &Value, path: &[&str]) -> f64 {
    safe_numeric_value(lookup(root, path), 0.0)
}

/// Integer count at `path`, or `0` when absent/non-numeric.
pub fn count_at(root: &Value, path: &[&str]) -> i64 {
    match lookup(root, path) {
        Some(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap_or(0),
        other => other.as_numeric().map(|v| v.round() as i64).unwrap_or(0),
    }
}

pub fn safe_numeric_value<T: AsNumeric>(value: T, default: f64) -> f64 {
    value.as_numeric().unwrap_or(default)
}

/// `true` only when `value` is numeric and strictly above `threshold`.
pub fn is_numeric_and_greater_than<T: AsNumeric>(value: T, threshold: f64) -> bool {
    value.as_numeric().is_some_and(|v| v > threshold)
}

/// `true` only when `value` is numeric and strictly below `threshold`.
pub fn is_numeric_and_less_than<T: AsNumeric>(value: T, threshold: f64) -> bool {
    value.as_numeric().is_some_and(|v| v < threshold)
}

/// Result of comparing a metric against its value one period earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Absolute difference `current - previous`.
    pub delta: Option<f64>,
    /// Relative change in percent, rounded to one decimal.
    pub percentage: Option<f64>,
    /// Signed label such as `+12.4%`, or `N/A`.
    pub formatted: String,
}

impl Change {
    fn unavailable() -> Self {
        Change {
            delta: None,
            percentage: None,
            formatted: TREND_UNAVAILABLE.to_string(),
        }
    }
}

/// Year-over-year style change between two values.
///
/// A zero, absent or non-numeric `previous` (or a non-numeric `current`)
/// yields the "unavailable" marker instead of a division error.
pub fn calculate_change<C: AsNumeric, P: AsNumeric>(current: C, previous: P) -> Change {
    let (Some(current), Some(previous)) = (current.as_numeric(), previous.as_numeric()) else {
        return Change::unavailable();
    };
    if previous == 0.0 {
        return Change::unavailable();
    }
    let delta = current - previous;
    let percentage = round_to(delta / previous * 100.0, 1);
    Change {
        delta: Some(delta),
        percentage: Some(percentage),
        formatted: format_signed_percentage(percentage),
    }
}

/// Fixed one-decimal percentage with no sign handling, e.g. `12.4%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Explicit `+`/`-` prefix followed by [`format_percentage`] of the magnitude.
pub fn format_signed_percentage(value: f64) -> String {
    if value >= 0.0 {
        format!("+{}", format_percentage(value))
    } else {
        format!("-{}", format_percentage(value.abs()))
    }
}

pub fn calculate_avg(total: f64, count: f64) -> Option<f64> {
    if count == 0.0 || !count.is_finite() || !total.is_finite() {
        return None;
    }
    Some(total / count)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places (comma as decimal separator), and
    // - dot thousands separators (e.g., `1.234.567,89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::de);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push(',');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `1.204 municipalities`).
    n.to_formatted_string(&Locale::de)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_is_rounded_and_signed() {
        let c = calculate_change(112.4, 100.0);
        assert_eq!(c.percentage, Some(12.4));
        assert_eq!(c.formatted, "+12.4%");
        assert_eq!(c.delta.map(|d| round_to(d, 1)), Some(12.4));

        let c = calculate_change(96.9, 100.0);
        assert_eq!(c.percentage, Some(-3.1));
        assert_eq!(c.formatted, "-3.1%");
    }

    #[test]
    fn change_matches_rounded_formula_for_many_pairs() {
        let pairs = [(120.0, 100.0), (7.0, 3.0), (1.0, 9.0), (-5.0, 4.0), (50.0, -25.0)];
        for (current, previous) in pairs {
            let expected = ((current - previous) / previous * 100.0 * 10.0_f64).round() / 10.0;
            let c = calculate_change(current, previous);
            assert_eq!(c.percentage, Some(expected));
            let sign = if expected >= 0.0 { "+" } else { "-" };
            assert_eq!(c.formatted, format!("{}{:.1}%", sign, expected.abs()));
        }
    }

    #[test]
    fn no_change_is_positive_zero() {
        assert_eq!(calculate_change(10_i64, 10_i64).formatted, "+0.0%");
    }

    #[test]
    fn change_unavailable_for_zero_or_non_numeric_previous() {
        assert_eq!(calculate_change(10.0, 0.0), Change::unavailable());
        assert_eq!(calculate_change(json!(10), json!("n/a")).formatted, "N/A");
        assert_eq!(calculate_change(json!(10), Value::Null).percentage, None);
        assert_eq!(calculate_change(None::<f64>, 4.0).delta, None);
    }

    #[test]
    fn guards_tolerate_missing_and_text() {
        assert!(is_numeric_and_greater_than(json!(5), 0.0));
        assert!(is_numeric_and_greater_than(json!("1,200"), 1000.0));
        assert!(!is_numeric_and_greater_than(json!("abc"), 0.0));
        assert!(!is_numeric_and_greater_than(Value::Null, -1.0));
        assert!(!is_numeric_and_greater_than(None::<&Value>, -1.0));
        assert!(!is_numeric_and_greater_than(f64::NAN, -1.0));
        assert!(is_numeric_and_less_than(-3_i64, 0.0));
        assert!(!is_numeric_and_less_than(json!([1]), 10.0));
    }

    #[test]
    fn lookups_default_to_zero() {
        let v = json!({"a": {"b": {"c": 4, "d": "2.5", "e": 3.6}}});
        assert_eq!(count_at(&v, &["a", "b", "c"]), 4);
        assert_eq!(count_at(&v, &["a", "b", "e"]), 4);
        assert_eq!(num_at(&v, &["a", "b", "d"]), 2.5);
        assert_eq!(num_at(&v, &["a", "x", "c"]), 0.0);
        assert_eq!(count_at(&v, &["a", "b", "c", "deeper"]), 0);
    }

    #[test]
    fn percentage_and_number_formatting() {
        assert_eq!(format_percentage(12.345), "12.3%");
        assert_eq!(format_signed_percentage(-0.04), "-0.0%");
        assert_eq!(format_number(1234567.891, 2), "1.234.567,89");
        assert_eq!(format_number(-42.0, 0), "-42");
        assert_eq!(format_int(12500), "12.500");
    }

    #[test]
    fn average_guards_zero_count() {
        assert_eq!(calculate_avg(300.0, 3.0), Some(100.0));
        assert_eq!(calculate_avg(300.0, 0.0), None);
    }
}
