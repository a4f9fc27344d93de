// Entry point and high-level CLI flow.
//
// - Option [1] loads the extracted municipality records, printing diagnostics.
// - Option [2] builds one report per municipality, writes them as JSON and
//   prints a preview table.
// - After generating reports, the user can choose to go back to the
//   selection menu or exit.
use chrono::Local;
use commune_report::loader;
use commune_report::output;
use commune_report::report::{preview_row, ReportPipeline};
use commune_report::types::MunicipalityInput;
use commune_report::util;
use commune_report::ProcessorConfig;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const INPUT_PATH: &str = "municipality_data.json";
const CONFIG_PATH: &str = "processors.toml";

// Load once, generate as often as needed in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<MunicipalityInput>>,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Heuristic overrides from `processors.toml`, or the built-in defaults.
fn load_config() -> ProcessorConfig {
    if !Path::new(CONFIG_PATH).exists() {
        return ProcessorConfig::default();
    }
    match ProcessorConfig::from_path(CONFIG_PATH) {
        Ok(config) => {
            info!("Loaded heuristics from {}", CONFIG_PATH);
            config
        }
        Err(e) => {
            warn!("Ignoring {}: {}", CONFIG_PATH, e);
            ProcessorConfig::default()
        }
    }
}

fn commune_key(commune: &Value) -> String {
    match commune.get("commune_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Handle option [1]: load the municipality records.
fn handle_load() {
    match loader::load_municipalities(INPUT_PATH) {
        Ok((data, load_report)) => {
            println!(
                "Processing dataset... ({} records read, {} municipalities loaded)",
                util::format_int(load_report.total_records),
                util::format_int(load_report.loaded_records)
            );
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} records skipped due to parse errors.",
                    util::format_int(load_report.parse_errors)
                );
            }
            println!();
            let mut state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
            state.data = Some(data);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: build every report, write them out and preview them.
fn handle_generate_reports(pipeline: &ReportPipeline) {
    let data = {
        let state = APP_STATE.lock().unwrap_or_else(PoisonError::into_inner);
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data loaded. Please load the data file first (option 1).\n");
        return;
    };

    println!("Generating reports...");
    let today = Local::now().date_naive();
    let mut reports = Vec::with_capacity(data.len());
    let mut ids = Vec::with_capacity(data.len());
    for input in &data {
        let id = commune_key(&input.commune);
        match pipeline.assemble(input, today) {
            Ok(report) => {
                ids.push(id);
                reports.push(report);
            }
            Err(e) => error!("Skipping commune {}: {}", id, e),
        }
    }

    let file = output::report_file_name(&ids);
    let written = match reports.as_slice() {
        [single] => output::write_json(&file, single),
        all => output::write_json(&file, &all),
    };
    if let Err(e) = written {
        eprintln!("Write error: {}", e);
    }

    println!("Municipality Reports\n");
    let rows: Vec<_> = reports.iter().map(preview_row).collect();
    output::preview_table_rows(&rows, 10);
    println!(
        "({} of {} reports exported to {})\n",
        util::format_int(reports.len()),
        util::format_int(data.len()),
        file
    );
}

fn main() {
    pretty_env_logger::init();
    let pipeline = ReportPipeline::new(load_config());

    loop {
        println!("Select an option:");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_generate_reports(&pipeline);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
