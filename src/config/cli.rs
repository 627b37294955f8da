use crate::adapters::http::{DEFAULT_CATALOG_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::config::{
    validate_settings, DEFAULT_ENRICHED_PATH, DEFAULT_INPUT_PATH, DEFAULT_REPORT_PATH,
};
use crate::core::report::DEFAULT_TOP_N;
use crate::core::ConfigProvider;
use crate::domain::model::TransactionFilter;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "sales-etl")]
#[command(about = "Enrich sales transactions with product catalog data and build a sales report")]
pub struct CliConfig {
    /// Directory the input and output paths are relative to
    #[arg(long, default_value = ".")]
    pub working_dir: String,

    /// Pipe-delimited transaction file
    #[arg(long, default_value = DEFAULT_INPUT_PATH)]
    pub input: String,

    #[arg(long, default_value = DEFAULT_ENRICHED_PATH)]
    pub enriched_output: String,

    #[arg(long, default_value = DEFAULT_REPORT_PATH)]
    pub report_output: String,

    /// Also write the report as JSON to this path
    #[arg(long)]
    pub report_json: Option<String>,

    /// Catalog endpoint; `{id}` is replaced by the numeric product key
    #[arg(long, default_value = DEFAULT_CATALOG_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Number of products listed in the report
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Only keep transactions from this region
    #[arg(long)]
    pub region: Option<String>,

    /// Only keep transactions worth at least this amount
    #[arg(long)]
    pub min_amount: Option<f64>,

    /// Only keep transactions worth at most this amount
    #[arg(long)]
    pub max_amount: Option<f64>,

    /// Skip catalog lookups entirely
    #[arg(long)]
    pub no_enrich: bool,

    /// Write a header row to the enriched output
    #[arg(long)]
    pub include_header: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn working_dir(&self) -> &str {
        &self.working_dir
    }

    fn input_path(&self) -> &str {
        &self.input
    }

    fn enriched_output_path(&self) -> &str {
        &self.enriched_output
    }

    fn report_output_path(&self) -> &str {
        &self.report_output
    }

    fn report_json_path(&self) -> Option<&str> {
        self.report_json.as_deref()
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn enrichment_enabled(&self) -> bool {
        !self.no_enrich
    }

    fn include_header(&self) -> bool {
        self.include_header
    }

    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            region: self.region.clone(),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
