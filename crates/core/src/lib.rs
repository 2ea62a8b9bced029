pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;

pub use config::{AppConfig, DatabaseConfig, EngineConfig, LogFormat, LoggingConfig};
pub use cpq::catalog::{Catalog, ProductLookup};
pub use cpq::prerequisites::PrerequisiteOutcome;
pub use cpq::rules::{GenerationOutcome, GenerationWarning, MappingRuleEngine};
pub use cpq::QuoteEngine;
pub use domain::configuration::Configuration;
pub use domain::pool::{PlumbingType, PoolDescriptor, PoolDimensions, PoolShape};
pub use domain::product::{CatalogProduct, CoefficientUnit, PriceType, ProductId};
pub use domain::quote::{LineItemSource, Quote, QuoteId, QuoteLineItem, QuoteStatus};
pub use domain::rule::{MappingRule, RuleId};
pub use domain::snapshot::{QuoteHeader, QuoteSnapshot, SnapshotPayload};
pub use errors::{CodecError, DomainError, PricingError, VersionError};
