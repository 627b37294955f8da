use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One raw sales event, as read from the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub customer_id: String,
    pub region: String,
}

impl Transaction {
    pub fn revenue(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Product attributes returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("product id has no numeric catalog key")]
    InvalidProductId,
    #[error("product not found in catalog")]
    NotFound,
    #[error("catalog returned HTTP {0}")]
    HttpStatus(u16),
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog request failed: {0}")]
    Transport(String),
    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),
}

pub type LookupResult = std::result::Result<ProductInfo, LookupFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Success,
    Failure,
    NotAttempted,
}

impl EnrichmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentStatus::Success => "success",
            EnrichmentStatus::Failure => "failure",
            EnrichmentStatus::NotAttempted => "not_attempted",
        }
    }
}

/// Catalog data is only reachable through `Success`.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Success(ProductInfo),
    Failure(LookupFailure),
    NotAttempted,
}

impl From<LookupResult> for Enrichment {
    fn from(result: LookupResult) -> Self {
        match result {
            Ok(info) => Enrichment::Success(info),
            Err(failure) => Enrichment::Failure(failure),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub enrichment: Enrichment,
}

impl EnrichedTransaction {
    pub fn status(&self) -> EnrichmentStatus {
        match self.enrichment {
            Enrichment::Success(_) => EnrichmentStatus::Success,
            Enrichment::Failure(_) => EnrichmentStatus::Failure,
            Enrichment::NotAttempted => EnrichmentStatus::NotAttempted,
        }
    }

    pub fn product_info(&self) -> Option<&ProductInfo> {
        match &self.enrichment {
            Enrichment::Success(info) => Some(info),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseErrorKind {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("invalid quantity '{0}'")]
    InvalidQuantity(String),
    #[error("invalid unit price '{0}'")]
    InvalidUnitPrice(String),
    #[error("invalid date '{0}'")]
    InvalidDate(String),
    #[error("empty transaction id")]
    EmptyTransactionId,
    #[error("empty product id")]
    EmptyProductId,
}

/// A malformed input line. Skipped and reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: u64,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anomaly {
    NonPositiveQuantity,
    NonPositivePrice,
    MissingRegion,
}

/// Counts of anomalous but accepted transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub non_positive_quantity: usize,
    pub non_positive_price: usize,
    pub missing_region: usize,
    /// Transactions carrying at least one anomaly.
    pub flagged_transactions: usize,
}

impl AnomalyCounts {
    pub fn record(&mut self, anomalies: &[Anomaly]) {
        if anomalies.is_empty() {
            return;
        }
        self.flagged_transactions += 1;
        for anomaly in anomalies {
            match anomaly {
                Anomaly::NonPositiveQuantity => self.non_positive_quantity += 1,
                Anomaly::NonPositivePrice => self.non_positive_price += 1,
                Anomaly::MissingRegion => self.missing_region += 1,
            }
        }
    }
}

/// Output of the reader: parsed transactions in input order plus the
/// lines that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub transactions: Vec<Transaction>,
    pub skipped: Vec<ParseError>,
    pub anomalies: AnomalyCounts,
}

/// Counters threaded from the earlier stages into the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub skipped: Vec<ParseError>,
    pub anomalies: AnomalyCounts,
    pub filtered_out: usize,
    pub catalog_lookups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub region: String,
    pub transactions: usize,
    pub revenue: f64,
    /// Percentage of total revenue, 0 when total revenue is 0.
    pub share: f64,
    pub average_transaction_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    /// Catalog name, or the raw product id when the product was never enriched.
    pub display_name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub orders: usize,
    pub total_spent: f64,
    pub average_order_value: f64,
}

/// One calendar day of sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub revenue: f64,
    pub transactions: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPeak {
    pub date: NaiveDate,
    pub revenue: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_transactions: usize,
    pub total_revenue: f64,
    pub average_order_value: f64,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub peak_day: Option<DailyPeak>,
    pub enriched: usize,
    pub enrichment_failed: usize,
    pub not_attempted: usize,
    pub enrichment_success_rate: f64,
    pub unmatched_products: Vec<String>,
    pub regions: Vec<RegionSummary>,
    pub top_products: Vec<ProductSummary>,
    pub top_n: usize,
    pub top_customers: Vec<CustomerSummary>,
    /// Ascending by date.
    pub daily_sales: Vec<DailySales>,
    /// Products whose total quantity is below `low_performance_threshold`,
    /// lowest quantity first.
    pub low_performers: Vec<ProductSummary>,
    pub low_performance_threshold: i64,
    pub stats: RunStats,
}

/// Enriched rows and the report computed from them.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub enriched: Vec<EnrichedTransaction>,
    pub summary: ReportSummary,
}

/// Where a completed run left its files.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub enriched_path: String,
    pub report_path: String,
    pub report_json_path: Option<String>,
    pub summary: ReportSummary,
}

/// Optional pre-enrichment filters. Amount is `quantity * unit_price`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub region: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl TransactionFilter {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.min_amount.is_none() && self.max_amount.is_none()
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        let amount = tx.revenue();
        self.region.as_deref().map_or(true, |r| tx.region == r)
            && self.min_amount.map_or(true, |min| amount >= min)
            && self.max_amount.map_or(true, |max| amount <= max)
    }
}
