use crate::domain::model::{LookupResult, ParsedBatch, RunOutcome, TransactionFilter, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Directory the input and output paths are relative to.
    fn working_dir(&self) -> &str;
    fn input_path(&self) -> &str;
    fn enriched_output_path(&self) -> &str;
    fn report_output_path(&self) -> &str;
    fn report_json_path(&self) -> Option<&str>;
    fn api_endpoint(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn top_n(&self) -> usize;
    fn enrichment_enabled(&self) -> bool;
    fn include_header(&self) -> bool;
    fn filter(&self) -> TransactionFilter;
}

/// Product catalog lookup. Failures come back as values, never as errors.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn lookup(&self, product_id: &str) -> LookupResult;

    /// Ids with the same memo key resolve to the same catalog entry and
    /// share one lookup per run.
    fn memo_key(&self, product_id: &str) -> String {
        product_id.to_string()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ParsedBatch>;
    async fn transform(&self, batch: ParsedBatch) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunOutcome>;
}
