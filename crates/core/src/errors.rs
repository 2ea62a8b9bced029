use thiserror::Error;

use crate::domain::product::ProductId;
use crate::domain::quote::{QuoteId, QuoteStatus};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid quote transition from {from:?} to {to:?}")]
    InvalidQuoteTransition { from: QuoteStatus, to: QuoteStatus },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Codec failures are locally recoverable: callers fall back to
/// "no base product matched" and keep generating.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed pool code `{0}`")]
    MalformedCode(String),
    #[error("unknown pool shape token `{0}`")]
    UnknownShape(String),
    #[error("unknown plumbing type token `{0}`")]
    UnknownType(String),
    #[error("invalid pool dimensions: {0}")]
    InvalidDimensions(String),
}

/// Pricing failures indicate catalog data defects and abort the operation;
/// they are never coerced to a zero price.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("product {product_id} is missing pricing input: {detail}")]
    MissingPricingInput { product_id: ProductId, detail: String },
    #[error("cyclic price reference detected at product {product_id}")]
    CyclicPriceReference { product_id: ProductId },
}

/// Version store failures are surfaced to the caller as rejected operations.
/// The db layer maps transport errors into `Storage`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("quote {quote_id} not found")]
    QuoteNotFound { quote_id: QuoteId },
    #[error("version {version} not found for quote {quote_id}")]
    VersionNotFound { quote_id: QuoteId, version: u32 },
    #[error("snapshot payload for quote {quote_id} version {version} is structurally incomplete")]
    EmptySnapshot { quote_id: QuoteId, version: u32 },
    #[error("version store failure: {0}")]
    Storage(String),
}
