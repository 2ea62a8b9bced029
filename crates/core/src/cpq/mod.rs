pub mod catalog;
pub mod codec;
pub mod prerequisites;
pub mod pricing;
pub mod rules;

use crate::config::EngineConfig;
use crate::domain::configuration::Configuration;
use crate::domain::rule::MappingRule;
use crate::errors::PricingError;

use self::catalog::ProductLookup;
use self::rules::{GenerationOutcome, MappingRuleEngine};

/// Facade wiring [`EngineConfig`] into the generation pipeline:
/// configuration -> pool code -> base product -> mapping rules -> priced items.
pub struct QuoteEngine {
    rule_engine: MappingRuleEngine,
}

impl QuoteEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self { rule_engine: MappingRuleEngine::new(config.skip_values.clone()) }
    }

    pub fn generate(
        &self,
        configuration: &Configuration,
        rules: &[MappingRule],
        catalog: &impl ProductLookup,
    ) -> Result<GenerationOutcome, PricingError> {
        self.rule_engine.generate(configuration, rules, catalog)
    }
}

impl Default for QuoteEngine {
    fn default() -> Self {
        Self { rule_engine: MappingRuleEngine::default() }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::catalog::Catalog;
    use super::QuoteEngine;
    use crate::config::EngineConfig;
    use crate::domain::configuration::Configuration;
    use crate::domain::pool::{PlumbingType, PoolDescriptor, PoolDimensions, PoolShape};
    use crate::domain::product::{CatalogProduct, CoefficientUnit, PriceType, ProductId};
    use crate::domain::rule::MappingRule;

    /// End-to-end: codec-driven base lookup, a percentage-priced accessory and
    /// a coefficient-priced liner resolved in one pass.
    #[test]
    fn generates_priced_quote_from_configuration() {
        let descriptor = PoolDescriptor::new(
            PoolShape::Circle,
            PlumbingType::Overflow,
            PoolDimensions::Circle { diameter: Decimal::new(35, 1), depth: Decimal::new(12, 1) },
        )
        .expect("valid circle");
        let configuration =
            Configuration::new(descriptor).with_field("installation", ["standard"]);

        let mut base =
            CatalogProduct::fixed("baz-kru-35", "Circle pool 3.5 m", Decimal::from(180_000));
        base.code = Some("BAZ-KRU-PR-3.5-1.2".to_string());

        let mut install = CatalogProduct::fixed("install", "Installation", Decimal::ZERO);
        install.price_type = PriceType::Percentage;
        install.price_reference_product_id = Some(ProductId("baz-kru-35".to_string()));
        install.price_percentage = Some(Decimal::from(15));

        let mut liner = CatalogProduct::fixed("liner", "Liner", Decimal::ZERO);
        liner.price_type = PriceType::Coefficient;
        liner.price_coefficient = Some(Decimal::from(100));
        liner.coefficient_unit = Some(CoefficientUnit::SquareMeter);

        let catalog = Catalog::new(vec![base, install.clone(), liner.clone()]);
        let rules = vec![
            MappingRule::new("r-install", "installation", "standard", Some(install.id.clone())),
            {
                let mut rule =
                    MappingRule::new("r-liner", "installation", "standard", Some(liner.id));
                rule.sort_order = 1;
                rule
            },
        ];

        let engine = QuoteEngine::new(&EngineConfig::default());
        let outcome = engine.generate(&configuration, &rules, &catalog).expect("generation");

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.items.len(), 3);
        assert_eq!(outcome.items[0].unit_price, Decimal::from(180_000));
        // 15% of 180000
        assert_eq!(outcome.items[1].unit_price, Decimal::from(27_000));
        // pi * 1.75^2 * 100 = 962.11... -> 962
        assert_eq!(outcome.items[2].unit_price, Decimal::from(962));
        assert_eq!(outcome.subtotal, Decimal::from(180_000 + 27_000 + 962));
    }
}
