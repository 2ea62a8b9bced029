use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::domain::rule::RuleId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(pub String);

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Order,
    Production,
    Cancelled,
}

/// Provenance of a quote line: generated base pool product, fired mapping
/// rule, or manual entry by a salesperson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineItemSource {
    PoolBasePrice,
    MappingRule { rule_id: RuleId },
    Manual,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteLineItem {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub sort_order: i32,
    pub source: LineItemSource,
}

impl QuoteLineItem {
    pub fn new(
        product_id: Option<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        sort_order: i32,
        source: LineItemSource,
    ) -> Self {
        Self {
            product_id,
            name: name.into(),
            category: category.into(),
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
            sort_order,
            source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub customer_name: String,
    pub status: QuoteStatus,
    pub currency: String,
    pub items: Vec<QuoteLineItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(|item| item.total_price).sum()
    }

    pub fn can_transition_to(&self, next: QuoteStatus) -> bool {
        matches!(
            (self.status, next),
            (QuoteStatus::Draft, QuoteStatus::Sent)
                | (QuoteStatus::Sent, QuoteStatus::Order)
                | (QuoteStatus::Order, QuoteStatus::Production)
                | (
                    QuoteStatus::Draft | QuoteStatus::Sent | QuoteStatus::Order,
                    QuoteStatus::Cancelled
                )
        )
    }

    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }

        Err(DomainError::InvalidQuoteTransition { from: self.status, to: next })
    }
}
