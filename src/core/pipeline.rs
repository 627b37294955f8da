use crate::adapters::http::HttpProductCatalog;
use crate::core::enricher::{skip_enrichment, ProductEnricher};
use crate::core::filter::apply_filter;
use crate::core::reader::{decode_input, parse_transactions};
use crate::core::report::aggregate;
use crate::core::writer::{render_enriched, render_report, render_report_json};
use crate::core::{ConfigProvider, Pipeline, ProductCatalog, Storage};
use crate::domain::model::{ParsedBatch, RunOutcome, RunStats, TransformResult};
use crate::utils::error::Result;
use chrono::Local;
use std::time::Duration;

/// Read → enrich → aggregate → write, over one input file.
pub struct SalesPipeline<S: Storage, C: ConfigProvider, P: ProductCatalog> {
    storage: S,
    config: C,
    catalog: P,
}

impl<S: Storage, C: ConfigProvider, P: ProductCatalog> SalesPipeline<S, C, P> {
    pub fn new(storage: S, config: C, catalog: P) -> Self {
        Self {
            storage,
            config,
            catalog,
        }
    }
}

impl<S: Storage, C: ConfigProvider> SalesPipeline<S, C, HttpProductCatalog> {
    /// Builds the pipeline against the HTTP catalog named in the configuration.
    pub fn from_config(storage: S, config: C) -> Result<Self> {
        let catalog = HttpProductCatalog::new(
            config.api_endpoint(),
            Duration::from_secs(config.request_timeout_secs()),
        )?;
        Ok(Self::new(storage, config, catalog))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, P: ProductCatalog> Pipeline for SalesPipeline<S, C, P> {
    async fn extract(&self) -> Result<ParsedBatch> {
        let path = self.config.input_path();
        tracing::debug!("Reading transactions from {}", path);

        let bytes = self.storage.read_file(path).await?;
        let text = decode_input(&bytes);
        parse_transactions(&text)
    }

    async fn transform(&self, batch: ParsedBatch) -> Result<TransformResult> {
        let ParsedBatch {
            transactions,
            skipped,
            anomalies,
        } = batch;

        let (transactions, filtered_out) = apply_filter(transactions, &self.config.filter());

        let outcome = if self.config.enrichment_enabled() {
            ProductEnricher::new(&self.catalog).enrich(transactions).await
        } else {
            tracing::info!("Catalog enrichment disabled, skipping lookups");
            skip_enrichment(transactions)
        };
        tracing::debug!("Catalog requests issued: {}", outcome.lookups);

        let stats = RunStats {
            skipped,
            anomalies,
            filtered_out,
            catalog_lookups: outcome.lookups,
        };
        let summary = aggregate(&outcome.transactions, stats, self.config.top_n());

        Ok(TransformResult {
            enriched: outcome.transactions,
            summary,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<RunOutcome> {
        let enriched_path = self.config.enriched_output_path();
        let enriched = render_enriched(&result.enriched, self.config.include_header())?;
        tracing::debug!("Writing {} enriched rows to {}", result.enriched.len(), enriched_path);
        self.storage.write_file(enriched_path, &enriched).await?;

        let report_path = self.config.report_output_path();
        let report = render_report(&result.summary, Local::now().naive_local());
        tracing::debug!("Writing report to {}", report_path);
        self.storage.write_file(report_path, report.as_bytes()).await?;

        let report_json_path = match self.config.report_json_path() {
            Some(path) => {
                let json = render_report_json(&result.summary)?;
                tracing::debug!("Writing JSON report to {}", path);
                self.storage.write_file(path, json.as_bytes()).await?;
                Some(path.to_string())
            }
            None => None,
        };

        Ok(RunOutcome {
            enriched_path: enriched_path.to_string(),
            report_path: report_path.to_string(),
            report_json_path,
            summary: result.summary,
        })
    }
}
