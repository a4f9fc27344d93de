//! Municipality report generation.
//!
//! Turns already-extracted statistical records for one municipality into a
//! structured report: building-permit aggregates with a construction
//! momentum index, plus income, unemployment and business indicators.

pub mod building_dev;
pub mod config;
pub mod economics;
pub mod error;
pub mod loader;
pub mod metadata;
pub mod output;
pub mod report;
pub mod section;
pub mod types;
pub mod util;

pub use building_dev::BuildingDevProcessor;
pub use config::ProcessorConfig;
pub use economics::EconomicsProcessor;
pub use error::{ConfigError, ProcessError};
pub use report::ReportPipeline;
pub use section::Section;
