use chrono::Utc;
use rust_decimal::Decimal;

use poolquote_core::domain::pool::PoolShape;
use poolquote_core::domain::product::{
    CatalogProduct, CoefficientUnit, PriceType, ProductId,
};
use poolquote_core::domain::quote::{LineItemSource, Quote, QuoteId, QuoteLineItem, QuoteStatus};
use poolquote_core::domain::rule::MappingRule;

use crate::repositories::{
    ProductRepository, QuoteRepository, RepositoryError, SqlProductRepository, SqlQuoteRepository,
    SqlRuleRepository, RuleRepository,
};
use crate::DbPool;

pub const DEMO_QUOTE_ID: &str = "quote-demo-001";

/// Deterministic demo catalog covering every pricing strategy: a coded base
/// pool, a percentage-priced installation, a coefficient-priced liner, and a
/// counter-current unit guarded by a shaft prerequisite (waived for circles).
pub fn demo_catalog() -> Vec<CatalogProduct> {
    let mut base =
        CatalogProduct::fixed("baz-obd-3060-15", "Rectangle pool 3x6x1.5", Decimal::from(210_000));
    base.code = Some("BAZ-OBD-SK-3.0-6.0-1.5".to_string());
    base.category = "pool".to_string();

    let mut shaft = CatalogProduct::fixed("shaft", "Technology shaft", Decimal::from(21_000));
    shaft.category = "technology".to_string();

    let mut install = CatalogProduct::fixed("install", "Installation", Decimal::ZERO);
    install.category = "services".to_string();
    install.price_type = PriceType::Percentage;
    install.price_reference_product_id = Some(ProductId("baz-obd-3060-15".to_string()));
    install.price_percentage = Some(Decimal::from(15));
    install.price_minimum = Some(Decimal::from(9000));

    let mut liner = CatalogProduct::fixed("liner-blue", "Blue liner", Decimal::ZERO);
    liner.category = "surface".to_string();
    liner.price_type = PriceType::Coefficient;
    liner.price_coefficient = Some(Decimal::from(450));
    liner.coefficient_unit = Some(CoefficientUnit::SquareMeter);

    let mut counter_current =
        CatalogProduct::fixed("counter-current", "Counter-current unit", Decimal::from(38_000));
    counter_current.category = "technology".to_string();
    counter_current.prerequisite_product_ids = vec![ProductId("shaft".to_string())];
    counter_current.prerequisite_pool_shapes = vec![PoolShape::Circle];

    vec![base, shaft, install, liner, counter_current]
}

pub fn demo_rules() -> Vec<MappingRule> {
    let mut shaft_rule = MappingRule::new(
        "rule-tech-shaft",
        "technology",
        "shaft",
        Some(ProductId("shaft".to_string())),
    );
    shaft_rule.sort_order = 10;

    let mut install_rule = MappingRule::new(
        "rule-install",
        "installation",
        "standard",
        Some(ProductId("install".to_string())),
    );
    install_rule.sort_order = 20;

    let mut liner_rule = MappingRule::new(
        "rule-surface-liner",
        "surface",
        "liner",
        Some(ProductId("liner-blue".to_string())),
    );
    liner_rule.sort_order = 30;

    // configured but never catalogued; generation skips it with a warning
    let mut unassigned = MappingRule::new("rule-lighting", "lighting", "led", None);
    unassigned.sort_order = 40;

    vec![shaft_rule, install_rule, liner_rule, unassigned]
}

pub fn demo_quote() -> Quote {
    let now = Utc::now();
    Quote {
        id: QuoteId(DEMO_QUOTE_ID.to_string()),
        customer_name: "Novak".to_string(),
        status: QuoteStatus::Draft,
        currency: "CZK".to_string(),
        items: vec![
            QuoteLineItem::new(
                Some(ProductId("baz-obd-3060-15".to_string())),
                "Rectangle pool 3x6x1.5",
                "pool",
                1,
                Decimal::from(210_000),
                0,
                LineItemSource::PoolBasePrice,
            ),
            QuoteLineItem::new(
                Some(ProductId("shaft".to_string())),
                "Technology shaft",
                "technology",
                1,
                Decimal::from(21_000),
                1,
                LineItemSource::Manual,
            ),
        ],
        created_at: now,
        updated_at: now,
    }
}

/// Seeds the demo catalog, rules and one draft quote. Idempotent: every write
/// is an upsert keyed by id.
pub async fn seed_demo(pool: &DbPool) -> Result<(), RepositoryError> {
    let products = SqlProductRepository::new(pool.clone());
    for product in demo_catalog() {
        products.save(product).await?;
    }

    let rules = SqlRuleRepository::new(pool.clone());
    for rule in demo_rules() {
        rules.save(rule).await?;
    }

    let quotes = SqlQuoteRepository::new(pool.clone());
    quotes.save(demo_quote()).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use poolquote_core::domain::quote::QuoteId;

    use super::{seed_demo, DEMO_QUOTE_ID};
    use crate::repositories::{
        ProductRepository, QuoteRepository, RuleRepository, SqlProductRepository,
        SqlQuoteRepository, SqlRuleRepository,
    };
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn seed_is_idempotent_and_round_trips() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        seed_demo(&pool).await.expect("first seed");
        seed_demo(&pool).await.expect("second seed");

        let products = SqlProductRepository::new(pool.clone());
        let active = products.list_active().await.expect("list products");
        assert_eq!(active.len(), 5);

        let base = products
            .find_by_code("baz-obd-sk-3.0-6.0-1.5")
            .await
            .expect("code lookup")
            .expect("base pool present");
        assert_eq!(base.id.0, "baz-obd-3060-15");

        let rules = SqlRuleRepository::new(pool.clone());
        let active_rules = rules.list_active().await.expect("list rules");
        assert_eq!(active_rules.len(), 4);
        assert!(active_rules.windows(2).all(|pair| pair[0].sort_order <= pair[1].sort_order));

        let quotes = SqlQuoteRepository::new(pool.clone());
        let quote = quotes
            .find_by_id(&QuoteId(DEMO_QUOTE_ID.to_string()))
            .await
            .expect("load quote")
            .expect("quote present");
        assert_eq!(quote.items.len(), 2);
        assert_eq!(quote.subtotal(), rust_decimal::Decimal::from(231_000));
    }
}
