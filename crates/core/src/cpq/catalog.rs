use crate::domain::product::{CatalogProduct, ProductId};

/// Lookup capability the pricing resolver and rule engine run against.
pub trait ProductLookup {
    fn find(&self, product_id: &ProductId) -> Option<&CatalogProduct>;
    fn find_by_code(&self, code: &str) -> Option<&CatalogProduct>;
}

#[derive(Default)]
pub struct Catalog {
    products: Vec<CatalogProduct>,
}

impl Catalog {
    pub fn new(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }
}

impl ProductLookup for Catalog {
    fn find(&self, product_id: &ProductId) -> Option<&CatalogProduct> {
        self.products.iter().find(|product| &product.id == product_id)
    }

    fn find_by_code(&self, code: &str) -> Option<&CatalogProduct> {
        let code = code.trim();
        self.products.iter().find(|product| {
            product.active
                && product.code.as_deref().is_some_and(|candidate| {
                    candidate.eq_ignore_ascii_case(code)
                })
        })
    }
}
