use async_trait::async_trait;
use thiserror::Error;

use poolquote_core::domain::product::{CatalogProduct, ProductId};
use poolquote_core::domain::quote::{Quote, QuoteId};
use poolquote_core::domain::rule::MappingRule;
use poolquote_core::domain::snapshot::QuoteSnapshot;
use poolquote_core::errors::VersionError;

pub mod memory;
pub mod product;
pub mod quote;
pub mod rule;
pub mod versions;

pub use memory::{InMemoryProductRepository, InMemoryQuoteStore, InMemoryRuleRepository};
pub use product::SqlProductRepository;
pub use quote::SqlQuoteRepository;
pub use rule::SqlRuleRepository;
pub use versions::SqlQuoteVersionStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<CatalogProduct>, RepositoryError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<CatalogProduct>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<CatalogProduct>, RepositoryError>;
    async fn save(&self, product: CatalogProduct) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Active rules ordered by `sort_order`; the order the engine also
    /// enforces with its own stable sort.
    async fn list_active(&self) -> Result<Vec<MappingRule>, RepositoryError>;
    async fn save(&self, rule: MappingRule) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    async fn find_by_id(&self, id: &QuoteId) -> Result<Option<Quote>, RepositoryError>;
    async fn save(&self, quote: Quote) -> Result<(), RepositoryError>;
}

/// Outcome of a restore: the version written back plus the automatic backup
/// snapshot taken of the pre-restore state.
#[derive(Clone, Debug, PartialEq)]
pub struct RestoreOutcome {
    pub restored_version: u32,
    pub backup: QuoteSnapshot,
}

#[async_trait]
pub trait QuoteVersionStore: Send + Sync {
    /// Copies the quote's current header and items into a new immutable
    /// snapshot. Version numbers are gap-free and monotonic per quote; the
    /// "read max, insert max + 1" step is serialized against concurrent
    /// snapshot calls.
    async fn snapshot(
        &self,
        quote_id: &QuoteId,
        notes: Option<String>,
    ) -> Result<QuoteSnapshot, VersionError>;

    /// Rolls the quote back to `target_version`, snapshotting the current
    /// state first so a restore is never destructive.
    async fn restore(
        &self,
        quote_id: &QuoteId,
        target_version: u32,
    ) -> Result<RestoreOutcome, VersionError>;

    async fn list_versions(&self, quote_id: &QuoteId)
        -> Result<Vec<QuoteSnapshot>, RepositoryError>;

    async fn find_version(
        &self,
        quote_id: &QuoteId,
        version: u32,
    ) -> Result<Option<QuoteSnapshot>, RepositoryError>;
}
