use crate::domain::model::{Transaction, TransactionFilter};

/// Keeps the transactions matching `filter`, in order, and returns how many
/// were dropped.
pub fn apply_filter(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
) -> (Vec<Transaction>, usize) {
    if filter.is_empty() {
        return (transactions, 0);
    }

    let before = transactions.len();
    let kept: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| filter.matches(tx))
        .collect();
    let removed = before - kept.len();

    tracing::info!(
        "🔧 Filter {:?} removed {} of {} transactions",
        filter,
        removed,
        before
    );
    (kept, removed)
}
