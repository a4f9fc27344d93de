use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// File name for a set of reports: one municipality gets its own file.
pub fn report_file_name(commune_ids: &[String]) -> String {
    match commune_ids {
        [single] => format!("report_{}.json", single),
        _ => "reports.json".to_string(),
    }
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_report_is_named_after_commune() {
        assert_eq!(report_file_name(&["62063".to_string()]), "report_62063.json");
        assert_eq!(report_file_name(&[]), "reports.json");
        assert_eq!(
            report_file_name(&["1".to_string(), "2".to_string()]),
            "reports.json"
        );
    }
}
