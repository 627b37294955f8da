use crate::core::Pipeline;
use crate::core::writer::format_amount;
use crate::domain::model::RunOutcome;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("🚀 Starting sales ETL run");

        // Extract
        tracing::info!("[1/3] Reading transactions...");
        let batch = self.pipeline.extract().await?;
        tracing::info!(
            "✓ Parsed {} transactions ({} malformed lines skipped)",
            batch.transactions.len(),
            batch.skipped.len()
        );

        // Transform
        tracing::info!("[2/3] Enriching and aggregating...");
        let result = self.pipeline.transform(batch).await?;
        let summary = &result.summary;
        tracing::info!(
            "✓ Enriched {}/{} transactions ({:.1}%) with {} catalog requests",
            summary.enriched,
            summary.total_transactions,
            summary.enrichment_success_rate * 100.0,
            summary.stats.catalog_lookups
        );

        // Load
        tracing::info!("[3/3] Writing outputs...");
        let outcome = self.pipeline.load(result).await?;
        tracing::info!("📁 Enriched data saved to: {}", outcome.enriched_path);
        tracing::info!("📁 Report saved to: {}", outcome.report_path);
        if let Some(path) = &outcome.report_json_path {
            tracing::info!("📁 JSON report saved to: {}", path);
        }

        Ok(outcome)
    }
}

/// One-paragraph console summary. Skipped and failed counts are always shown.
pub fn completion_message(outcome: &RunOutcome) -> String {
    let summary = &outcome.summary;
    format!(
        "✅ Processed {} transactions (revenue {})\n\
         ⚠️  Skipped lines: {} | Failed lookups: {} | Filtered out: {}\n\
         🔎 Enriched: {}/{} ({:.2}%)\n\
         📁 Enriched data: {}\n\
         📁 Report: {}",
        summary.total_transactions,
        format_amount(summary.total_revenue),
        summary.stats.skipped.len(),
        summary.enrichment_failed,
        summary.stats.filtered_out,
        summary.enriched,
        summary.total_transactions,
        summary.enrichment_success_rate * 100.0,
        outcome.enriched_path,
        outcome.report_path
    )
}
