use crate::domain::model::{EnrichedTransaction, Enrichment, LookupResult, Transaction};
use crate::domain::ports::ProductCatalog;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub transactions: Vec<EnrichedTransaction>,
    /// Catalog calls actually issued, one per distinct memo key at most.
    pub lookups: usize,
}

/// Merges catalog data into transactions. The memo lives as long as the
/// enricher, so each pipeline run builds a fresh one.
pub struct ProductEnricher<'a, P: ProductCatalog + ?Sized> {
    catalog: &'a P,
    memo: HashMap<String, LookupResult>,
    lookups: usize,
}

impl<'a, P: ProductCatalog + ?Sized> ProductEnricher<'a, P> {
    pub fn new(catalog: &'a P) -> Self {
        Self {
            catalog,
            memo: HashMap::new(),
            lookups: 0,
        }
    }

    async fn resolve(&mut self, product_id: &str) -> LookupResult {
        let key = self.catalog.memo_key(product_id);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }

        self.lookups += 1;
        let result = self.catalog.lookup(product_id).await;
        match &result {
            Ok(info) => tracing::debug!("🔎 {} -> {}", product_id, info.name),
            Err(failure) => tracing::warn!("🔎 Lookup failed for {}: {}", product_id, failure),
        }
        self.memo.insert(key, result.clone());
        result
    }

    pub async fn enrich(mut self, transactions: Vec<Transaction>) -> EnrichmentOutcome {
        let mut enriched = Vec::with_capacity(transactions.len());

        for transaction in transactions {
            let result = self.resolve(&transaction.product_id).await;
            enriched.push(EnrichedTransaction {
                transaction,
                enrichment: Enrichment::from(result),
            });
        }

        EnrichmentOutcome {
            transactions: enriched,
            lookups: self.lookups,
        }
    }
}

/// Attaches `NotAttempted` to every transaction without touching the catalog.
pub fn skip_enrichment(transactions: Vec<Transaction>) -> EnrichmentOutcome {
    EnrichmentOutcome {
        transactions: transactions
            .into_iter()
            .map(|transaction| EnrichedTransaction {
                transaction,
                enrichment: Enrichment::NotAttempted,
            })
            .collect(),
        lookups: 0,
    }
}
