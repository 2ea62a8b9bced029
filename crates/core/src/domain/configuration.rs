use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::pool::PoolDescriptor;

/// The configurator's persisted output: the pool descriptor plus the free-form
/// attribute selections the mapping rules are matched against. Multi-select
/// fields carry several values under one key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub descriptor: PoolDescriptor,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Configuration {
    pub fn new(descriptor: PoolDescriptor) -> Self {
        Self { descriptor, fields: BTreeMap::new() }
    }

    pub fn with_field(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.fields.insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn values(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has_value(&self, field: &str, value: &str) -> bool {
        self.values(field).iter().any(|candidate| candidate == value)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Configuration;
    use crate::domain::pool::{PlumbingType, PoolDescriptor, PoolDimensions, PoolShape};

    fn descriptor() -> PoolDescriptor {
        PoolDescriptor::new(
            PoolShape::Circle,
            PlumbingType::Skimmer,
            PoolDimensions::Circle { diameter: Decimal::from(4), depth: Decimal::new(12, 1) },
        )
        .expect("valid descriptor")
    }

    #[test]
    fn resolves_multi_select_field_values() {
        let configuration = descriptor_configuration();

        assert!(configuration.has_value("technology", "shaft"));
        assert!(configuration.has_value("technology", "heating"));
        assert!(!configuration.has_value("technology", "wall"));
        assert!(configuration.values("lighting").is_empty());
    }

    fn descriptor_configuration() -> Configuration {
        Configuration::new(descriptor()).with_field("technology", ["shaft", "heating"])
    }
}
