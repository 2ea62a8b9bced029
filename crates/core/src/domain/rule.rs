use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::pool::{PlumbingType, PoolShape};
use crate::domain::product::ProductId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One declarative row of the configuration-to-product mapping table.
///
/// A rule fires when the configuration's resolved value for `config_field`
/// equals `config_value` and the pool's shape/plumbing are members of the
/// constraint sets when those are present. `product_id` is nullable: rules
/// whose effect was configured but never catalogued are skipped with a
/// diagnostic. `sort_order` defines output ordering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub id: RuleId,
    pub config_field: String,
    pub config_value: String,
    pub pool_shapes: Option<Vec<PoolShape>>,
    pub plumbing_types: Option<Vec<PlumbingType>>,
    pub quantity: u32,
    pub product_id: Option<ProductId>,
    pub active: bool,
    pub sort_order: i32,
}

impl MappingRule {
    pub fn new(
        id: impl Into<String>,
        config_field: impl Into<String>,
        config_value: impl Into<String>,
        product_id: Option<ProductId>,
    ) -> Self {
        Self {
            id: RuleId(id.into()),
            config_field: config_field.into(),
            config_value: config_value.into(),
            pool_shapes: None,
            plumbing_types: None,
            quantity: 1,
            product_id,
            active: true,
            sort_order: 0,
        }
    }
}
