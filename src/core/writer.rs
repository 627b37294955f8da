use crate::core::reader::DATE_FORMAT;
use crate::domain::model::{EnrichedTransaction, ReportSummary};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDateTime;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// Column order of the enriched output file.
pub const ENRICHED_HEADER: [&str; 14] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
    "API_Title",
    "API_Category",
    "API_Brand",
    "API_Price",
    "API_Rating",
    "EnrichmentStatus",
];

const RULE: &str = "--------------------------------------------";
const BANNER: &str = "============================================";

/// Catalog text must not break the pipe-delimited layout.
fn sanitize(value: &str) -> String {
    value.replace(['|', '\r', '\n'], " ")
}

fn optional_text(value: Option<&String>) -> String {
    value.map(|v| sanitize(v)).unwrap_or_default()
}

fn optional_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn enriched_row(row: &EnrichedTransaction) -> [String; 14] {
    let tx = &row.transaction;
    let info = row.product_info();
    [
        tx.transaction_id.clone(),
        tx.date.format(DATE_FORMAT).to_string(),
        tx.product_id.clone(),
        sanitize(&tx.product_name),
        tx.quantity.to_string(),
        tx.unit_price.to_string(),
        tx.customer_id.clone(),
        tx.region.clone(),
        info.map(|i| sanitize(&i.name)).unwrap_or_default(),
        optional_text(info.and_then(|i| i.category.as_ref())),
        optional_text(info.and_then(|i| i.brand.as_ref())),
        optional_number(info.and_then(|i| i.price)),
        optional_number(info.and_then(|i| i.rating)),
        row.status().as_str().to_string(),
    ]
}

/// Serializes enriched transactions, one `|`-delimited line each. Catalog
/// columns stay empty unless the lookup succeeded.
pub fn render_enriched(rows: &[EnrichedTransaction], include_header: bool) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if include_header {
        writer.write_record(ENRICHED_HEADER)?;
    }
    for row in rows {
        writer.write_record(enriched_row(row))?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    // -0.001 格式化後是 0.00，不帶負號
    if value < 0.0 && fixed != "0.00" {
        format!("-{}.{}", grouped, dec_part)
    } else {
        format!("{}.{}", grouped, dec_part)
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

fn section(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(RULE);
    out.push('\n');
}

/// Renders the human-readable report: SUMMARY, ENRICHMENT RATE,
/// REGIONAL BREAKDOWN and TOP PRODUCTS, always in that order, followed by
/// TOP CUSTOMERS, DAILY SALES TREND and PERFORMANCE ANALYSIS.
pub fn render_report(summary: &ReportSummary, generated_at: NaiveDateTime) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", BANNER));
    out.push_str("           SALES ANALYTICS REPORT\n");
    out.push_str(&format!(
        "  Generated: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("{}\n\n", BANNER));

    // 1. 總覽
    section(&mut out, "SUMMARY");
    out.push_str(&format!(
        "Total Transactions:    {}\n",
        summary.total_transactions
    ));
    out.push_str(&format!(
        "Total Revenue:         {}\n",
        format_amount(summary.total_revenue)
    ));
    out.push_str(&format!(
        "Average Order Value:   {}\n",
        format_amount(summary.average_order_value)
    ));
    match &summary.date_range {
        Some((from, to)) => out.push_str(&format!(
            "Date Range:            {} to {}\n",
            from.format(DATE_FORMAT),
            to.format(DATE_FORMAT)
        )),
        None => out.push_str("Date Range:            N/A\n"),
    }
    match &summary.peak_day {
        Some(peak) => out.push_str(&format!(
            "Peak Sales Day:        {} ({}, {} transactions)\n",
            peak.date.format(DATE_FORMAT),
            format_amount(peak.revenue),
            peak.transactions
        )),
        None => out.push_str("Peak Sales Day:        N/A\n"),
    }

    let stats = &summary.stats;
    out.push_str(&format!("Skipped Lines:         {}\n", stats.skipped.len()));
    for skipped in &stats.skipped {
        out.push_str(&format!("  {}\n", skipped));
    }
    out.push_str(&format!(
        "Anomalous Records:     {}\n",
        stats.anomalies.flagged_transactions
    ));
    if stats.anomalies.flagged_transactions > 0 {
        out.push_str(&format!(
            "  non-positive quantity: {}\n  non-positive price:    {}\n  missing region:        {}\n",
            stats.anomalies.non_positive_quantity,
            stats.anomalies.non_positive_price,
            stats.anomalies.missing_region
        ));
    }
    out.push_str(&format!("Filtered Out:          {}\n\n", stats.filtered_out));

    // 2. 補充資料成功率
    section(&mut out, "ENRICHMENT RATE");
    out.push_str(&format!(
        "Enriched:              {} of {}\n",
        summary.enriched, summary.total_transactions
    ));
    out.push_str(&format!(
        "Success Rate:          {:.2}%\n",
        summary.enrichment_success_rate * 100.0
    ));
    out.push_str(&format!(
        "Failed Lookups:        {}\n",
        summary.enrichment_failed
    ));
    out.push_str(&format!("Not Attempted:         {}\n", summary.not_attempted));
    out.push_str(&format!("Catalog Requests:      {}\n", stats.catalog_lookups));
    let unmatched = if summary.unmatched_products.is_empty() {
        "None".to_string()
    } else {
        summary.unmatched_products.join(", ")
    };
    out.push_str(&format!("Unmatched Products:    {}\n\n", unmatched));

    // 3. 區域
    section(&mut out, "REGIONAL BREAKDOWN");
    if summary.regions.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&format!(
            "{:<16}{:>12}{:>18}{:>10}\n",
            "Region", "Transactions", "Revenue", "Share"
        ));
        for region in &summary.regions {
            let name = if region.region.is_empty() {
                "(unknown)"
            } else {
                region.region.as_str()
            };
            out.push_str(&format!(
                "{:<16}{:>12}{:>18}{:>9.2}%\n",
                truncate(name, 15),
                region.transactions,
                format_amount(region.revenue),
                region.share
            ));
        }
    }
    out.push('\n');

    // 4. 熱銷商品
    section(
        &mut out,
        &format!("TOP PRODUCTS (by quantity, top {})", summary.top_n),
    );
    if summary.top_products.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&format!(
            "{:<6}{:<12}{:<26}{:<16}{:>10}{:>18}\n",
            "Rank", "Product ID", "Name", "Category", "Quantity", "Revenue"
        ));
        for (rank, product) in summary.top_products.iter().enumerate() {
            out.push_str(&format!(
                "{:<6}{:<12}{:<26}{:<16}{:>10}{:>18}\n",
                rank + 1,
                truncate(&product.product_id, 11),
                truncate(&product.display_name, 25),
                truncate(product.category.as_deref().unwrap_or("-"), 15),
                product.quantity,
                format_amount(product.revenue)
            ));
        }
    }
    out.push('\n');

    // 5. 主要客戶
    section(
        &mut out,
        &format!("TOP CUSTOMERS (by total spent, top {})", summary.top_n),
    );
    if summary.top_customers.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&format!(
            "{:<6}{:<14}{:>18}{:>8}{:>18}\n",
            "Rank", "Customer ID", "Total Spent", "Orders", "Avg Order"
        ));
        for (rank, customer) in summary.top_customers.iter().enumerate() {
            out.push_str(&format!(
                "{:<6}{:<14}{:>18}{:>8}{:>18}\n",
                rank + 1,
                truncate(&customer.customer_id, 13),
                format_amount(customer.total_spent),
                customer.orders,
                format_amount(customer.average_order_value)
            ));
        }
    }
    out.push('\n');

    // 6. 每日趨勢
    section(&mut out, "DAILY SALES TREND");
    if summary.daily_sales.is_empty() {
        out.push_str("(none)\n");
    } else {
        out.push_str(&format!(
            "{:<12}{:>18}{:>14}{:>18}\n",
            "Date", "Revenue", "Transactions", "Unique Customers"
        ));
        for day in &summary.daily_sales {
            out.push_str(&format!(
                "{:<12}{:>18}{:>14}{:>18}\n",
                day.date.format(DATE_FORMAT),
                format_amount(day.revenue),
                day.transactions,
                day.unique_customers
            ));
        }
    }
    out.push('\n');

    // 7. 績效分析
    section(&mut out, "PERFORMANCE ANALYSIS");
    let low_performers = if summary.low_performers.is_empty() {
        "None".to_string()
    } else {
        summary
            .low_performers
            .iter()
            .map(|p| format!("{} ({} units)", p.display_name, p.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    };
    out.push_str(&format!(
        "Low Performing Products (< {} units): {}\n",
        summary.low_performance_threshold, low_performers
    ));
    out.push_str("Average Transaction Value per Region:\n");
    if summary.regions.is_empty() {
        out.push_str("  (none)\n");
    } else {
        for region in &summary.regions {
            let name = if region.region.is_empty() {
                "(unknown)"
            } else {
                region.region.as_str()
            };
            out.push_str(&format!(
                "  {:<16}{:>18}\n",
                truncate(name, 15),
                format_amount(region.average_transaction_value)
            ));
        }
    }

    out
}

pub fn render_report_json(summary: &ReportSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
