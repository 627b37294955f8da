use crate::adapters::http::{DEFAULT_CATALOG_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::config::{
    validate_settings, DEFAULT_ENRICHED_PATH, DEFAULT_INPUT_PATH, DEFAULT_REPORT_PATH,
};
use crate::core::report::DEFAULT_TOP_N;
use crate::core::ConfigProvider;
use crate::domain::model::TransactionFilter;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    pub catalog: CatalogConfig,
    pub transform: TransformConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "sales-etl".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub working_dir: String,
    pub path: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            working_dir: ".".to_string(),
            path: DEFAULT_INPUT_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_CATALOG_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub top_n: usize,
    pub region: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            region: None,
            min_amount: None,
            max_amount: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub enriched_path: String,
    pub report_path: String,
    pub report_json_path: Option<String>,
    pub include_header: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enriched_path: DEFAULT_ENRICHED_PATH.to_string(),
            report_path: DEFAULT_REPORT_PATH.to_string(),
            report_json_path: None,
            include_header: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|source| EtlError::ReadError {
                path: path.as_ref().display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline.name
    }
}

impl ConfigProvider for TomlConfig {
    fn working_dir(&self) -> &str {
        &self.input.working_dir
    }

    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn enriched_output_path(&self) -> &str {
        &self.output.enriched_path
    }

    fn report_output_path(&self) -> &str {
        &self.output.report_path
    }

    fn report_json_path(&self) -> Option<&str> {
        self.output.report_json_path.as_deref()
    }

    fn api_endpoint(&self) -> &str {
        &self.catalog.endpoint
    }

    fn request_timeout_secs(&self) -> u64 {
        self.catalog.timeout_seconds
    }

    fn top_n(&self) -> usize {
        self.transform.top_n
    }

    fn enrichment_enabled(&self) -> bool {
        self.catalog.enabled
    }

    fn include_header(&self) -> bool {
        self.output.include_header
    }

    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            region: self.transform.region.clone(),
            min_amount: self.transform.min_amount,
            max_amount: self.transform.max_amount,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
