#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::TomlConfig;

use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_amount_bounds, validate_endpoint_template, validate_path, validate_positive_number,
    validate_range,
};

pub const DEFAULT_INPUT_PATH: &str = "data/sales_data.txt";
pub const DEFAULT_ENRICHED_PATH: &str = "data/enriched_sales_data.txt";
pub const DEFAULT_REPORT_PATH: &str = "output/sales_report.txt";

/// Checks shared by every configuration source.
pub fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_path("working_dir", config.working_dir())?;
    validate_path("input_path", config.input_path())?;
    validate_path("enriched_output_path", config.enriched_output_path())?;
    validate_path("report_output_path", config.report_output_path())?;
    if let Some(path) = config.report_json_path() {
        validate_path("report_json_path", path)?;
    }

    // 輸出不可覆蓋輸入檔
    let input = config.input_path();
    for (field, output) in [
        ("enriched_output_path", Some(config.enriched_output_path())),
        ("report_output_path", Some(config.report_output_path())),
        ("report_json_path", config.report_json_path()),
    ] {
        if output == Some(input) {
            return Err(EtlError::InvalidConfigValueError {
                field: field.to_string(),
                value: input.to_string(),
                reason: "Output path must differ from the input path".to_string(),
            });
        }
    }

    if config.enrichment_enabled() {
        validate_endpoint_template("api_endpoint", config.api_endpoint())?;
        validate_range("request_timeout_secs", config.request_timeout_secs(), 1, 300)?;
    }
    validate_positive_number("top_n", config.top_n(), 1)?;

    let filter = config.filter();
    validate_amount_bounds(filter.min_amount, filter.max_amount)?;
    Ok(())
}
