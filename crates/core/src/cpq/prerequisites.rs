use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cpq::catalog::ProductLookup;
use crate::domain::pool::PoolShape;
use crate::domain::product::{CatalogProduct, PriceType, ProductId};
use crate::domain::quote::QuoteLineItem;

/// Classification of a manual add against the candidate's prerequisites.
/// The validator never mutates the quote; whether missing prerequisites get
/// auto-added or the action is rejected is the caller's decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PrerequisiteOutcome {
    Allowed { waived_by_shape: bool },
    Blocked { missing: Vec<CatalogProduct> },
}

impl PrerequisiteOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

pub fn check(
    candidate: &CatalogProduct,
    current_items: &[QuoteLineItem],
    pool_shape: PoolShape,
    catalog: &impl ProductLookup,
) -> PrerequisiteOutcome {
    if candidate.prerequisite_product_ids.is_empty() {
        return PrerequisiteOutcome::Allowed { waived_by_shape: false };
    }

    if candidate.prerequisite_pool_shapes.contains(&pool_shape) {
        return PrerequisiteOutcome::Allowed { waived_by_shape: true };
    }

    let present: HashSet<&ProductId> =
        current_items.iter().filter_map(|item| item.product_id.as_ref()).collect();

    let mut missing = Vec::new();
    for required in &candidate.prerequisite_product_ids {
        if present.contains(required) {
            continue;
        }
        match catalog.find(required) {
            Some(product) => missing.push(product.clone()),
            None => {
                // A prerequisite pointing outside the catalog is a data
                // defect; it still blocks the add.
                warn!(
                    candidate = %candidate.id,
                    prerequisite = %required,
                    "prerequisite references a product missing from the catalog"
                );
                missing.push(unknown_product(required));
            }
        }
    }

    if missing.is_empty() {
        PrerequisiteOutcome::Allowed { waived_by_shape: false }
    } else {
        PrerequisiteOutcome::Blocked { missing }
    }
}

fn unknown_product(product_id: &ProductId) -> CatalogProduct {
    CatalogProduct {
        id: product_id.clone(),
        name: format!("unknown product {product_id}"),
        category: String::new(),
        code: None,
        unit_price: Decimal::ZERO,
        price_type: PriceType::Fixed,
        price_reference_product_id: None,
        price_percentage: None,
        price_minimum: None,
        price_coefficient: None,
        coefficient_unit: None,
        prerequisite_product_ids: Vec::new(),
        prerequisite_pool_shapes: Vec::new(),
        active: false,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{check, PrerequisiteOutcome};
    use crate::cpq::catalog::Catalog;
    use crate::domain::pool::PoolShape;
    use crate::domain::product::{CatalogProduct, ProductId};
    use crate::domain::quote::{LineItemSource, QuoteLineItem};

    fn counter_current() -> CatalogProduct {
        let mut product =
            CatalogProduct::fixed("counter-current", "Counter-current unit", Decimal::from(38_000));
        product.prerequisite_product_ids = vec![ProductId("shaft".to_string())];
        product.prerequisite_pool_shapes = vec![PoolShape::Circle];
        product
    }

    fn shaft() -> CatalogProduct {
        CatalogProduct::fixed("shaft", "Technology shaft", Decimal::from(21_000))
    }

    fn line_for(product: &CatalogProduct) -> QuoteLineItem {
        QuoteLineItem::new(
            Some(product.id.clone()),
            product.name.clone(),
            product.category.clone(),
            1,
            product.unit_price,
            0,
            LineItemSource::Manual,
        )
    }

    #[test]
    fn product_without_prerequisites_is_allowed() {
        let catalog = Catalog::new(vec![shaft()]);
        let outcome = check(&shaft(), &[], PoolShape::RectangleRounded, &catalog);
        assert_eq!(outcome, PrerequisiteOutcome::Allowed { waived_by_shape: false });
    }

    #[test]
    fn matching_pool_shape_waives_the_check() {
        let catalog = Catalog::new(vec![counter_current(), shaft()]);
        let outcome = check(&counter_current(), &[], PoolShape::Circle, &catalog);
        assert_eq!(outcome, PrerequisiteOutcome::Allowed { waived_by_shape: true });
    }

    #[test]
    fn missing_prerequisite_blocks_with_full_records() {
        let catalog = Catalog::new(vec![counter_current(), shaft()]);
        let outcome = check(&counter_current(), &[], PoolShape::RectangleRounded, &catalog);

        let PrerequisiteOutcome::Blocked { missing } = outcome else {
            panic!("expected blocked outcome");
        };
        assert_eq!(missing, vec![shaft()]);
    }

    #[test]
    fn present_prerequisite_allows_the_add() {
        let catalog = Catalog::new(vec![counter_current(), shaft()]);
        let items = vec![line_for(&shaft())];
        let outcome = check(&counter_current(), &items, PoolShape::RectangleRounded, &catalog);
        assert_eq!(outcome, PrerequisiteOutcome::Allowed { waived_by_shape: false });
    }

    #[test]
    fn prerequisite_missing_from_catalog_still_blocks() {
        let catalog = Catalog::new(vec![counter_current()]);
        let outcome = check(&counter_current(), &[], PoolShape::RectangleSharp, &catalog);

        let PrerequisiteOutcome::Blocked { missing } = outcome else {
            panic!("expected blocked outcome");
        };
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, ProductId("shaft".to_string()));
        assert!(!missing[0].active);
    }
}
