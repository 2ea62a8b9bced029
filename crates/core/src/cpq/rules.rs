use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cpq::catalog::ProductLookup;
use crate::cpq::{codec, pricing};
use crate::domain::configuration::Configuration;
use crate::domain::product::ProductId;
use crate::domain::quote::{LineItemSource, QuoteLineItem};
use crate::domain::rule::{MappingRule, RuleId};
use crate::errors::PricingError;

/// Configuration values that universally mean "no product needed".
const DEFAULT_SKIP_VALUES: &[&str] = &["none"];

/// Non-fatal diagnostics collected while generating a quote. A partial quote
/// with warnings is more useful to the caller than no quote at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationWarning {
    BaseProductNotFound { code: String },
    UnassignedRule { rule_id: RuleId },
    UnknownProduct { rule_id: RuleId, product_id: ProductId },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseProductNotFound { code } => {
                write!(f, "no base pool product matches code {code}")
            }
            Self::UnassignedRule { rule_id } => {
                write!(f, "mapping rule {rule_id} fired but has no catalog product assigned")
            }
            Self::UnknownProduct { rule_id, product_id } => {
                write!(f, "mapping rule {rule_id} targets unknown product {product_id}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub items: Vec<QuoteLineItem>,
    pub warnings: Vec<GenerationWarning>,
    pub subtotal: Decimal,
}

/// Interprets the declarative mapping table against a configuration.
/// Rules are data rows evaluated by one generic matcher, so new configuration
/// fields need no engine change.
pub struct MappingRuleEngine {
    skip_values: Vec<String>,
}

impl Default for MappingRuleEngine {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_VALUES.iter().map(ToString::to_string).collect())
    }
}

impl MappingRuleEngine {
    pub fn new(skip_values: Vec<String>) -> Self {
        Self { skip_values }
    }

    /// Turns a configuration into an ordered, priced item list: the base pool
    /// product first (when its code matches a catalog row), then one item per
    /// firing rule in ascending `sort_order`. Emission order is a correctness
    /// property; downstream documents render items in list order.
    pub fn generate(
        &self,
        configuration: &Configuration,
        rules: &[MappingRule],
        catalog: &impl ProductLookup,
    ) -> Result<GenerationOutcome, PricingError> {
        let mut items = Vec::new();
        let mut warnings = Vec::new();
        let mut sort_order = 0;
        let descriptor = &configuration.descriptor;

        let code = codec::encode(descriptor);
        match catalog.find_by_code(&code) {
            Some(base) => {
                let unit_price = pricing::resolve_unit_price(base, catalog, Some(descriptor))?;
                items.push(QuoteLineItem::new(
                    Some(base.id.clone()),
                    base.name.clone(),
                    base.category.clone(),
                    1,
                    unit_price,
                    sort_order,
                    LineItemSource::PoolBasePrice,
                ));
                sort_order += 1;
            }
            None => {
                warn!(%code, "no base pool product matches the configuration code");
                warnings.push(GenerationWarning::BaseProductNotFound { code });
            }
        }

        // Stable sort; rule set insertion order carries no meaning.
        let mut ordered: Vec<&MappingRule> = rules.iter().filter(|rule| rule.active).collect();
        ordered.sort_by_key(|rule| rule.sort_order);

        for rule in ordered {
            if !self.fires(rule, configuration) {
                continue;
            }

            let Some(product_id) = rule.product_id.as_ref() else {
                debug!(rule_id = %rule.id, "mapping rule fired without a catalog product assigned");
                warnings.push(GenerationWarning::UnassignedRule { rule_id: rule.id.clone() });
                continue;
            };
            let Some(product) = catalog.find(product_id) else {
                warn!(
                    rule_id = %rule.id,
                    product_id = %product_id,
                    "mapping rule targets a product missing from the catalog"
                );
                warnings.push(GenerationWarning::UnknownProduct {
                    rule_id: rule.id.clone(),
                    product_id: product_id.clone(),
                });
                continue;
            };

            let unit_price = pricing::resolve_unit_price(product, catalog, Some(descriptor))?;
            items.push(QuoteLineItem::new(
                Some(product.id.clone()),
                product.name.clone(),
                product.category.clone(),
                rule.quantity,
                unit_price,
                sort_order,
                LineItemSource::MappingRule { rule_id: rule.id.clone() },
            ));
            sort_order += 1;
        }

        let subtotal = items.iter().map(|item| item.total_price).sum();
        Ok(GenerationOutcome { items, warnings, subtotal })
    }

    fn fires(&self, rule: &MappingRule, configuration: &Configuration) -> bool {
        if self.is_skipped(&rule.config_value) {
            return false;
        }
        if !configuration.has_value(&rule.config_field, &rule.config_value) {
            return false;
        }
        if let Some(shapes) = &rule.pool_shapes {
            if !shapes.contains(&configuration.descriptor.shape()) {
                return false;
            }
        }
        if let Some(types) = &rule.plumbing_types {
            if !types.contains(&configuration.descriptor.plumbing()) {
                return false;
            }
        }
        true
    }

    fn is_skipped(&self, value: &str) -> bool {
        self.skip_values.iter().any(|skip| skip.eq_ignore_ascii_case(value))
    }
}
