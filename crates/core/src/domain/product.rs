use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::pool::PoolShape;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    Fixed,
    Percentage,
    Coefficient,
}

/// Dimension a coefficient rate is multiplied against. `m` is read as the
/// waterline perimeter, `m3` as the water volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoefficientUnit {
    #[serde(rename = "m2")]
    SquareMeter,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "m3")]
    CubicMeter,
}

/// A catalog row. Written by catalog administration, read-only to the engine.
///
/// `code` is only set on base pool products and follows the pool code grammar.
/// The `price_*` fields are strategy-specific: `percentage` rows carry a
/// reference product and a percentage, `coefficient` rows carry a rate and a
/// unit; either may carry a `price_minimum` floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub code: Option<String>,
    pub unit_price: Decimal,
    pub price_type: PriceType,
    pub price_reference_product_id: Option<ProductId>,
    pub price_percentage: Option<Decimal>,
    pub price_minimum: Option<Decimal>,
    pub price_coefficient: Option<Decimal>,
    pub coefficient_unit: Option<CoefficientUnit>,
    pub prerequisite_product_ids: Vec<ProductId>,
    pub prerequisite_pool_shapes: Vec<PoolShape>,
    pub active: bool,
}

impl CatalogProduct {
    /// Plain fixed-price row; the starting point most catalog entries share.
    pub fn fixed(id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            id: ProductId(id.into()),
            name: name.into(),
            category: String::new(),
            code: None,
            unit_price,
            price_type: PriceType::Fixed,
            price_reference_product_id: None,
            price_percentage: None,
            price_minimum: None,
            price_coefficient: None,
            coefficient_unit: None,
            prerequisite_product_ids: Vec::new(),
            prerequisite_pool_shapes: Vec::new(),
            active: true,
        }
    }
}
