use crate::domain::model::{
    CustomerSummary, DailyPeak, DailySales, EnrichedTransaction, EnrichmentStatus, ProductInfo,
    ProductSummary, RegionSummary, ReportSummary, RunStats,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Length of the top-products listing unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 5;

/// Products selling fewer units than this are listed as low performers.
pub const LOW_PERFORMANCE_THRESHOLD: i64 = 10;

#[derive(Default)]
struct ProductTotals<'a> {
    quantity: i64,
    revenue: f64,
    info: Option<&'a ProductInfo>,
}

/// Builds the report from the full enriched sequence. Every transaction
/// counts toward the totals whatever its enrichment status.
pub fn aggregate(
    transactions: &[EnrichedTransaction],
    stats: RunStats,
    top_n: usize,
) -> ReportSummary {
    let total_transactions = transactions.len();
    let total_revenue: f64 = transactions.iter().map(|t| t.transaction.revenue()).sum();

    let count_status = |status: EnrichmentStatus| {
        transactions.iter().filter(|t| t.status() == status).count()
    };
    let enriched = count_status(EnrichmentStatus::Success);
    let enrichment_failed = count_status(EnrichmentStatus::Failure);
    let not_attempted = count_status(EnrichmentStatus::NotAttempted);

    let enrichment_success_rate = if total_transactions == 0 {
        0.0
    } else {
        enriched as f64 / total_transactions as f64
    };

    let average_order_value = if total_transactions == 0 {
        0.0
    } else {
        total_revenue / total_transactions as f64
    };

    let unmatched_products: Vec<String> = transactions
        .iter()
        .filter(|t| t.status() == EnrichmentStatus::Failure)
        .map(|t| t.transaction.product_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let daily_sales = daily_sales(transactions);

    ReportSummary {
        total_transactions,
        total_revenue,
        average_order_value,
        date_range: date_range(transactions),
        peak_day: peak_day(&daily_sales),
        enriched,
        enrichment_failed,
        not_attempted,
        enrichment_success_rate,
        unmatched_products,
        regions: region_breakdown(transactions, total_revenue),
        top_products: top_products(transactions, top_n),
        top_n,
        top_customers: top_customers(transactions, top_n),
        daily_sales,
        low_performers: low_performing_products(transactions, LOW_PERFORMANCE_THRESHOLD),
        low_performance_threshold: LOW_PERFORMANCE_THRESHOLD,
        stats,
    }
}

fn date_range(transactions: &[EnrichedTransaction]) -> Option<(NaiveDate, NaiveDate)> {
    let dates = transactions.iter().map(|t| t.transaction.date);
    Some((dates.clone().min()?, dates.max()?))
}

/// Revenue, transaction count and distinct customers per date, oldest first.
pub fn daily_sales(transactions: &[EnrichedTransaction]) -> Vec<DailySales> {
    let mut daily: BTreeMap<NaiveDate, (f64, usize, HashSet<&str>)> = BTreeMap::new();
    for t in transactions {
        let entry = daily.entry(t.transaction.date).or_default();
        entry.0 += t.transaction.revenue();
        entry.1 += 1;
        entry.2.insert(t.transaction.customer_id.as_str());
    }

    daily
        .into_iter()
        .map(|(date, (revenue, transactions, customers))| DailySales {
            date,
            revenue,
            transactions,
            unique_customers: customers.len(),
        })
        .collect()
}

/// Highest daily revenue; the earliest date wins a tie.
fn peak_day(daily: &[DailySales]) -> Option<DailyPeak> {
    let mut peak: Option<&DailySales> = None;
    for day in daily {
        if peak.map_or(true, |p| day.revenue > p.revenue) {
            peak = Some(day);
        }
    }
    peak.map(|day| DailyPeak {
        date: day.date,
        revenue: day.revenue,
        transactions: day.transactions,
    })
}

/// Regions by revenue descending, ties by region name ascending.
pub fn region_breakdown(
    transactions: &[EnrichedTransaction],
    total_revenue: f64,
) -> Vec<RegionSummary> {
    let mut totals: HashMap<&str, (usize, f64)> = HashMap::new();
    for t in transactions {
        let entry = totals.entry(t.transaction.region.as_str()).or_default();
        entry.0 += 1;
        entry.1 += t.transaction.revenue();
    }

    let mut regions: Vec<RegionSummary> = totals
        .into_iter()
        .map(|(region, (count, revenue))| RegionSummary {
            region: region.to_string(),
            transactions: count,
            revenue,
            share: if total_revenue != 0.0 {
                revenue / total_revenue * 100.0
            } else {
                0.0
            },
            average_transaction_value: revenue / count as f64,
        })
        .collect();

    regions.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.region.cmp(&b.region))
    });
    regions
}

fn product_totals(transactions: &[EnrichedTransaction]) -> Vec<ProductSummary> {
    let mut totals: HashMap<&str, ProductTotals> = HashMap::new();
    for t in transactions {
        let entry = totals.entry(t.transaction.product_id.as_str()).or_default();
        // 數量加總飽和於 i64 上限
        entry.quantity = entry.quantity.saturating_add(t.transaction.quantity);
        entry.revenue += t.transaction.revenue();
        if entry.info.is_none() {
            entry.info = t.product_info();
        }
    }

    totals
        .into_iter()
        .map(|(product_id, totals)| ProductSummary {
            product_id: product_id.to_string(),
            display_name: totals
                .info
                .map(|info| info.name.clone())
                .unwrap_or_else(|| product_id.to_string()),
            category: totals.info.and_then(|info| info.category.clone()),
            quantity: totals.quantity,
            revenue: totals.revenue,
        })
        .collect()
}

/// Products by total quantity descending, ties by product id ascending.
pub fn top_products(transactions: &[EnrichedTransaction], top_n: usize) -> Vec<ProductSummary> {
    let mut products = product_totals(transactions);
    products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(top_n);
    products
}

/// Products with total quantity below `threshold`, lowest quantity first,
/// ties by product id ascending.
pub fn low_performing_products(
    transactions: &[EnrichedTransaction],
    threshold: i64,
) -> Vec<ProductSummary> {
    let mut products: Vec<ProductSummary> = product_totals(transactions)
        .into_iter()
        .filter(|p| p.quantity < threshold)
        .collect();
    products.sort_by(|a, b| {
        a.quantity
            .cmp(&b.quantity)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products
}

/// Customers by total spent descending, ties by customer id ascending.
pub fn top_customers(transactions: &[EnrichedTransaction], top_n: usize) -> Vec<CustomerSummary> {
    let mut totals: HashMap<&str, (usize, f64)> = HashMap::new();
    for t in transactions {
        let entry = totals.entry(t.transaction.customer_id.as_str()).or_default();
        entry.0 += 1;
        entry.1 += t.transaction.revenue();
    }

    let mut customers: Vec<CustomerSummary> = totals
        .into_iter()
        .map(|(customer_id, (orders, total_spent))| CustomerSummary {
            customer_id: customer_id.to_string(),
            orders,
            total_spent,
            average_order_value: total_spent / orders as f64,
        })
        .collect();

    customers.sort_by(|a, b| {
        b.total_spent
            .total_cmp(&a.total_spent)
            .then_with(|| a.customer_id.cmp(&b.customer_id))
    });
    customers.truncate(top_n);
    customers
}
