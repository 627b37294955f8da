use crate::domain::model::{Anomaly, ParseError, ParseErrorKind, ParsedBatch, Transaction};
use crate::utils::error::Result;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

/// `TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region`
pub const TRANSACTION_FIELDS: usize = 8;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decodes the raw input file. Falls back to Latin-1 when the bytes are not UTF-8.
pub fn decode_input(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
        Err(e) => {
            tracing::warn!("Input is not valid UTF-8 ({}), decoding as Latin-1", e);
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

/// Parses the transaction file. Malformed lines are skipped and recorded in
/// `ParsedBatch::skipped`; only a CSV reader failure is returned as an error.
pub fn parse_transactions(text: &str) -> Result<ParsedBatch> {
    read_records(text, TRANSACTION_FIELDS)
}

/// Reads an enriched output file back into its transactions. The catalog
/// columns are ignored.
pub fn parse_enriched(text: &str) -> Result<ParsedBatch> {
    read_records(text, crate::core::writer::ENRICHED_HEADER.len())
}

fn read_records(text: &str, expected_fields: usize) -> Result<ParsedBatch> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut batch = ParsedBatch::default();
    let mut record = StringRecord::new();
    let mut first_record = true;

    while reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if is_blank(&record) {
            continue;
        }
        // 只有第一筆非空白資料可能是標題列
        if std::mem::take(&mut first_record) && is_header(&record) {
            tracing::debug!("Skipping header on line {}", line);
            continue;
        }

        match parse_record(&record, line, expected_fields) {
            Ok((transaction, anomalies)) => {
                if !anomalies.is_empty() {
                    tracing::debug!(
                        "Transaction {} flagged: {:?}",
                        transaction.transaction_id,
                        anomalies
                    );
                }
                batch.anomalies.record(&anomalies);
                batch.transactions.push(transaction);
            }
            Err(e) => {
                tracing::warn!("Skipping malformed {}", e);
                batch.skipped.push(e);
            }
        }
    }

    tracing::debug!(
        "Parsed {} transactions, skipped {} lines",
        batch.transactions.len(),
        batch.skipped.len()
    );
    Ok(batch)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn is_header(record: &StringRecord) -> bool {
    record
        .get(0)
        .map(|field| field.trim().replace('_', "").eq_ignore_ascii_case("transactionid"))
        .unwrap_or(false)
}

/// Thousands separators show up in both names and numbers.
fn strip_commas(value: &str) -> String {
    value.replace(',', "").trim().to_string()
}

fn parse_record(
    record: &StringRecord,
    line: u64,
    expected_fields: usize,
) -> std::result::Result<(Transaction, Vec<Anomaly>), ParseError> {
    let fail = |kind| ParseError { line, kind };

    if record.len() != expected_fields {
        return Err(fail(ParseErrorKind::FieldCount {
            expected: expected_fields,
            found: record.len(),
        }));
    }

    let field = |index: usize| record.get(index).unwrap_or("").trim();

    let transaction_id = field(0);
    if transaction_id.is_empty() {
        return Err(fail(ParseErrorKind::EmptyTransactionId));
    }

    let date = NaiveDate::parse_from_str(field(1), DATE_FORMAT)
        .map_err(|_| fail(ParseErrorKind::InvalidDate(field(1).to_string())))?;

    let product_id = field(2);
    if product_id.is_empty() {
        return Err(fail(ParseErrorKind::EmptyProductId));
    }

    let quantity = strip_commas(field(4))
        .parse::<i64>()
        .map_err(|_| fail(ParseErrorKind::InvalidQuantity(field(4).to_string())))?;

    let unit_price = strip_commas(field(5))
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .ok_or_else(|| fail(ParseErrorKind::InvalidUnitPrice(field(5).to_string())))?;

    let transaction = Transaction {
        transaction_id: transaction_id.to_string(),
        date,
        product_id: product_id.to_string(),
        product_name: strip_commas(field(3)),
        quantity,
        unit_price,
        customer_id: field(6).to_string(),
        region: field(7).to_string(),
    };

    let mut anomalies = Vec::new();
    if transaction.quantity <= 0 {
        anomalies.push(Anomaly::NonPositiveQuantity);
    }
    if transaction.unit_price <= 0.0 {
        anomalies.push(Anomaly::NonPositivePrice);
    }
    if transaction.region.is_empty() {
        anomalies.push(Anomaly::MissingRegion);
    }

    Ok((transaction, anomalies))
}
