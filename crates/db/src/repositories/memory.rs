use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use poolquote_core::domain::product::{CatalogProduct, ProductId};
use poolquote_core::domain::quote::{Quote, QuoteId};
use poolquote_core::domain::rule::MappingRule;
use poolquote_core::domain::snapshot::{QuoteSnapshot, SnapshotPayload};
use poolquote_core::errors::VersionError;

use super::{
    ProductRepository, QuoteRepository, QuoteVersionStore, RepositoryError, RestoreOutcome,
    RuleRepository,
};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, CatalogProduct>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogProduct>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .find(|product| {
                product.active
                    && product
                        .code
                        .as_deref()
                        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(code.trim()))
            })
            .cloned())
    }

    async fn list_active(&self) -> Result<Vec<CatalogProduct>, RepositoryError> {
        let products = self.products.read().await;
        let mut active: Vec<CatalogProduct> =
            products.values().filter(|product| product.active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn save(&self, product: CatalogProduct) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryRuleRepository {
    rules: RwLock<HashMap<String, MappingRule>>,
}

#[async_trait::async_trait]
impl RuleRepository for InMemoryRuleRepository {
    async fn list_active(&self) -> Result<Vec<MappingRule>, RepositoryError> {
        let rules = self.rules.read().await;
        let mut active: Vec<MappingRule> =
            rules.values().filter(|rule| rule.active).cloned().collect();
        active.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.id.0.cmp(&b.id.0)));
        Ok(active)
    }

    async fn save(&self, rule: MappingRule) -> Result<(), RepositoryError> {
        let mut rules = self.rules.write().await;
        rules.insert(rule.id.0.clone(), rule);
        Ok(())
    }
}

#[derive(Default)]
struct QuoteState {
    quotes: HashMap<String, Quote>,
    snapshots: HashMap<String, Vec<QuoteSnapshot>>,
}

/// In-memory quote store with version history. One lock guards quotes and
/// snapshots together, which serializes the version counter the same way the
/// SQL store's write transaction does.
#[derive(Default)]
pub struct InMemoryQuoteStore {
    state: RwLock<QuoteState>,
}

impl InMemoryQuoteStore {
    fn append_snapshot(
        state: &mut QuoteState,
        quote_id: &QuoteId,
        notes: Option<String>,
    ) -> Result<QuoteSnapshot, VersionError> {
        let quote = state
            .quotes
            .get(&quote_id.0)
            .ok_or_else(|| VersionError::QuoteNotFound { quote_id: quote_id.clone() })?;
        let payload = SnapshotPayload::of_quote(quote);

        let chain = state.snapshots.entry(quote_id.0.clone()).or_default();
        let version_number =
            chain.last().map(|snapshot| snapshot.version_number).unwrap_or(0) + 1;
        let snapshot = QuoteSnapshot {
            id: Uuid::new_v4().to_string(),
            quote_id: quote_id.clone(),
            version_number,
            content_hash: payload.content_hash(),
            payload,
            notes,
            created_at: Utc::now(),
        };
        chain.push(snapshot.clone());
        Ok(snapshot)
    }
}

#[async_trait::async_trait]
impl QuoteRepository for InMemoryQuoteStore {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.quotes.get(&id.0).cloned())
    }

    async fn save(&self, quote: Quote) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state.quotes.insert(quote.id.0.clone(), quote);
        Ok(())
    }
}

#[async_trait::async_trait]
impl QuoteVersionStore for InMemoryQuoteStore {
    async fn snapshot(
        &self,
        quote_id: &QuoteId,
        notes: Option<String>,
    ) -> Result<QuoteSnapshot, VersionError> {
        let mut state = self.state.write().await;
        Self::append_snapshot(&mut state, quote_id, notes)
    }

    async fn restore(
        &self,
        quote_id: &QuoteId,
        target_version: u32,
    ) -> Result<RestoreOutcome, VersionError> {
        let mut state = self.state.write().await;

        let target = state
            .snapshots
            .get(&quote_id.0)
            .and_then(|chain| {
                chain.iter().find(|snapshot| snapshot.version_number == target_version)
            })
            .cloned()
            .ok_or_else(|| VersionError::VersionNotFound {
                quote_id: quote_id.clone(),
                version: target_version,
            })?;

        let backup = Self::append_snapshot(
            &mut state,
            quote_id,
            Some(format!("automatic backup before restore to v{target_version}")),
        )?;

        let quote = state
            .quotes
            .get_mut(&quote_id.0)
            .ok_or_else(|| VersionError::QuoteNotFound { quote_id: quote_id.clone() })?;
        quote.customer_name = target.payload.header.customer_name.clone();
        quote.status = target.payload.header.status;
        quote.currency = target.payload.header.currency.clone();
        quote.items = target.payload.items.clone();
        quote.updated_at = Utc::now();

        Ok(RestoreOutcome { restored_version: target_version, backup })
    }

    async fn list_versions(
        &self,
        quote_id: &QuoteId,
    ) -> Result<Vec<QuoteSnapshot>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.snapshots.get(&quote_id.0).cloned().unwrap_or_default())
    }

    async fn find_version(
        &self,
        quote_id: &QuoteId,
        version: u32,
    ) -> Result<Option<QuoteSnapshot>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.snapshots.get(&quote_id.0).and_then(|chain| {
            chain.iter().find(|snapshot| snapshot.version_number == version).cloned()
        }))
    }
}
