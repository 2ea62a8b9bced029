use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::cpq::catalog::ProductLookup;
use crate::domain::pool::PoolDescriptor;
use crate::domain::product::{CatalogProduct, CoefficientUnit, PriceType, ProductId};
use crate::errors::PricingError;

/// The domain has no sub-unit currency; every resolved price is rounded
/// half-up to a whole currency unit.
fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn missing_input(product: &CatalogProduct, detail: impl Into<String>) -> PricingError {
    PricingError::MissingPricingInput { product_id: product.id.clone(), detail: detail.into() }
}

/// Resolves a product's final unit price under its pricing strategy.
///
/// Percentage references may chain through further percentage-priced
/// products; the chain is walked with a visited set so untrusted catalog data
/// can only fail fast with `CyclicPriceReference`, never recurse unbounded.
/// Coefficient pricing needs the active pool descriptor to derive its
/// dimension from; callers without one (e.g. catalog browsing) pass `None`
/// and get `MissingPricingInput` for coefficient rows.
pub fn resolve_unit_price(
    product: &CatalogProduct,
    catalog: &impl ProductLookup,
    descriptor: Option<&PoolDescriptor>,
) -> Result<Decimal, PricingError> {
    let mut visited: HashSet<ProductId> = HashSet::new();
    let mut chain: Vec<&CatalogProduct> = Vec::new();
    let mut current = product;

    let mut price = loop {
        match current.price_type {
            PriceType::Fixed => break current.unit_price,
            PriceType::Coefficient => break coefficient_price(current, descriptor)?,
            PriceType::Percentage => {
                if !visited.insert(current.id.clone()) {
                    return Err(PricingError::CyclicPriceReference {
                        product_id: current.id.clone(),
                    });
                }
                chain.push(current);

                let reference_id =
                    current.price_reference_product_id.as_ref().ok_or_else(|| {
                        missing_input(current, "percentage price without a reference product")
                    })?;
                current = catalog.find(reference_id).ok_or_else(|| {
                    missing_input(
                        current,
                        format!("reference product {reference_id} not in catalog"),
                    )
                })?;
            }
        }
    };

    // Unwind the percentage chain from the base outwards, applying the floor
    // and whole-unit rounding at each product.
    for hop in chain.iter().rev() {
        let percentage = hop
            .price_percentage
            .ok_or_else(|| missing_input(hop, "percentage price without a percentage"))?;
        let mut value = price * percentage / Decimal::ONE_HUNDRED;
        if let Some(minimum) = hop.price_minimum {
            if value < minimum {
                value = minimum;
            }
        }
        price = round_currency(value);
    }

    Ok(price)
}

fn coefficient_price(
    product: &CatalogProduct,
    descriptor: Option<&PoolDescriptor>,
) -> Result<Decimal, PricingError> {
    let coefficient = product
        .price_coefficient
        .ok_or_else(|| missing_input(product, "coefficient price without a rate"))?;
    let unit = product
        .coefficient_unit
        .ok_or_else(|| missing_input(product, "coefficient price without a unit"))?;
    let descriptor = descriptor
        .ok_or_else(|| missing_input(product, "coefficient price requires a pool configuration"))?;

    let dimension = match unit {
        CoefficientUnit::SquareMeter => descriptor.surface_area_m2(),
        CoefficientUnit::Meter => descriptor.perimeter_m(),
        CoefficientUnit::CubicMeter => descriptor.volume_m3(),
    };

    let mut value = coefficient * dimension;
    if let Some(minimum) = product.price_minimum {
        if value < minimum {
            value = minimum;
        }
    }
    Ok(round_currency(value))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::resolve_unit_price;
    use crate::cpq::catalog::Catalog;
    use crate::domain::pool::{PlumbingType, PoolDescriptor, PoolDimensions, PoolShape};
    use crate::domain::product::{CatalogProduct, CoefficientUnit, PriceType, ProductId};
    use crate::errors::PricingError;

    fn percentage_of(
        id: &str,
        reference: &str,
        percentage: Decimal,
        minimum: Option<Decimal>,
    ) -> CatalogProduct {
        let mut product = CatalogProduct::fixed(id, id, Decimal::ZERO);
        product.price_type = PriceType::Percentage;
        product.price_reference_product_id = Some(ProductId(reference.to_string()));
        product.price_percentage = Some(percentage);
        product.price_minimum = minimum;
        product
    }

    fn descriptor() -> PoolDescriptor {
        PoolDescriptor::new(
            PoolShape::RectangleRounded,
            PlumbingType::Skimmer,
            PoolDimensions::Rectangle {
                width: Decimal::from(3),
                length: Decimal::from(6),
                depth: Decimal::new(15, 1),
            },
        )
        .expect("valid rectangle")
    }

    #[test]
    fn fixed_price_is_returned_unchanged() {
        let product = CatalogProduct::fixed("cover", "Pool cover", Decimal::from(7400));
        let catalog = Catalog::new(vec![product.clone()]);

        assert_eq!(resolve_unit_price(&product, &catalog, None), Ok(Decimal::from(7400)));
    }

    #[test]
    fn percentage_price_derives_from_reference() {
        let base = CatalogProduct::fixed("base", "Base pool", Decimal::from(10_000));
        let installation = percentage_of("install", "base", Decimal::from(15), None);
        let catalog = Catalog::new(vec![base, installation.clone()]);

        assert_eq!(resolve_unit_price(&installation, &catalog, None), Ok(Decimal::from(1500)));
    }

    #[test]
    fn percentage_price_clamps_up_to_minimum() {
        let base = CatalogProduct::fixed("base", "Base pool", Decimal::from(10_000));
        let installation =
            percentage_of("install", "base", Decimal::from(15), Some(Decimal::from(2000)));
        let catalog = Catalog::new(vec![base, installation.clone()]);

        assert_eq!(resolve_unit_price(&installation, &catalog, None), Ok(Decimal::from(2000)));
    }

    #[test]
    fn chained_percentage_references_cascade() {
        let base = CatalogProduct::fixed("base", "Base pool", Decimal::from(200_000));
        let install = percentage_of("install", "base", Decimal::from(10), None);
        let handling = percentage_of("handling", "install", Decimal::from(50), None);
        let catalog = Catalog::new(vec![base, install, handling.clone()]);

        assert_eq!(resolve_unit_price(&handling, &catalog, None), Ok(Decimal::from(10_000)));
    }

    #[test]
    fn percentage_result_rounds_half_up_to_whole_units() {
        let base = CatalogProduct::fixed("base", "Base pool", Decimal::from(333));
        let install = percentage_of("install", "base", Decimal::new(105, 1), None);
        let catalog = Catalog::new(vec![base, install.clone()]);

        // 333 * 10.5% = 34.965 -> 35
        assert_eq!(resolve_unit_price(&install, &catalog, None), Ok(Decimal::from(35)));
    }

    #[test]
    fn cyclic_references_fail_fast() {
        let first = percentage_of("x", "y", Decimal::from(10), None);
        let second = percentage_of("y", "x", Decimal::from(10), None);
        let catalog = Catalog::new(vec![first.clone(), second]);

        assert!(matches!(
            resolve_unit_price(&first, &catalog, None),
            Err(PricingError::CyclicPriceReference { .. })
        ));
    }

    #[test]
    fn self_referencing_product_is_a_cycle() {
        let product = percentage_of("x", "x", Decimal::from(10), None);
        let catalog = Catalog::new(vec![product.clone()]);

        assert!(matches!(
            resolve_unit_price(&product, &catalog, None),
            Err(PricingError::CyclicPriceReference { .. })
        ));
    }

    #[test]
    fn percentage_without_reference_is_a_data_defect() {
        let mut product = CatalogProduct::fixed("install", "Installation", Decimal::ZERO);
        product.price_type = PriceType::Percentage;
        product.price_percentage = Some(Decimal::from(15));
        let catalog = Catalog::new(vec![product.clone()]);

        assert!(matches!(
            resolve_unit_price(&product, &catalog, None),
            Err(PricingError::MissingPricingInput { .. })
        ));
    }

    #[test]
    fn coefficient_price_multiplies_surface_area() {
        let mut liner = CatalogProduct::fixed("liner", "Liner", Decimal::ZERO);
        liner.price_type = PriceType::Coefficient;
        liner.price_coefficient = Some(Decimal::from(100));
        liner.coefficient_unit = Some(CoefficientUnit::SquareMeter);
        let catalog = Catalog::new(vec![liner.clone()]);

        // 3 x 6 m plan -> 18 m2
        assert_eq!(
            resolve_unit_price(&liner, &catalog, Some(&descriptor())),
            Ok(Decimal::from(1800))
        );
    }

    #[test]
    fn coefficient_price_clamps_up_to_minimum() {
        let mut coping = CatalogProduct::fixed("coping", "Coping stones", Decimal::ZERO);
        coping.price_type = PriceType::Coefficient;
        coping.price_coefficient = Some(Decimal::from(10));
        coping.coefficient_unit = Some(CoefficientUnit::Meter);
        coping.price_minimum = Some(Decimal::from(500));
        let catalog = Catalog::new(vec![coping.clone()]);

        // perimeter 18 m x 10 = 180, below the 500 floor
        assert_eq!(
            resolve_unit_price(&coping, &catalog, Some(&descriptor())),
            Ok(Decimal::from(500))
        );
    }

    #[test]
    fn coefficient_price_without_configuration_is_a_data_defect() {
        let mut liner = CatalogProduct::fixed("liner", "Liner", Decimal::ZERO);
        liner.price_type = PriceType::Coefficient;
        liner.price_coefficient = Some(Decimal::from(100));
        liner.coefficient_unit = Some(CoefficientUnit::SquareMeter);
        let catalog = Catalog::new(vec![liner.clone()]);

        assert!(matches!(
            resolve_unit_price(&liner, &catalog, None),
            Err(PricingError::MissingPricingInput { .. })
        ));
    }
}
