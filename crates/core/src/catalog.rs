//! Static sustainable-alternatives catalog

use async_trait::async_trait;

use crate::errors::DomainError;
use crate::personalize::{AlternativeRecord, Co2Savings, Price, MAX_ALTERNATIVES};

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, DomainError>;

/// Validated product-name query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery(String);

impl ProductQuery {
    /// Trim the raw name and reject empty input.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyProductName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Source of candidate alternatives for a product query.
#[async_trait]
pub trait AlternativesCatalog: Send + Sync {
    async fn find_alternatives(
        &self,
        query: &ProductQuery,
    ) -> CatalogResult<Vec<AlternativeRecord>>;
}

/// Curated alternative tied to a product category.
#[derive(Debug, Clone, Copy)]
struct AlternativeSeed {
    name: &'static str,
    price: f64,
    co2_percent: f64,
    reason: &'static str,
}

impl AlternativeSeed {
    fn to_record(self) -> AlternativeRecord {
        AlternativeRecord::new(self.name, Price::Amount(self.price))
            .with_co2_savings(Co2Savings::Amount(self.co2_percent))
            .with_reason(self.reason)
    }
}

#[derive(Debug, Clone, Copy)]
struct CategorySeed {
    keyword: &'static str,
    alternatives: &'static [AlternativeSeed],
}

// Match order matters: the first keyword contained in the product name wins.
const CATEGORY_SEEDS: &[CategorySeed] = &[
    CategorySeed {
        keyword: "phone",
        alternatives: &[
            AlternativeSeed {
                name: "Refurbished iPhone 12",
                price: 399.0,
                co2_percent: 65.0,
                reason: "Refurbished reduces manufacturing emissions by 65%",
            },
            AlternativeSeed {
                name: "Used iPhone 11",
                price: 299.0,
                co2_percent: 70.0,
                reason: "Pre-owned reduces new production waste",
            },
        ],
    },
    CategorySeed {
        keyword: "chair",
        alternatives: &[
            AlternativeSeed {
                name: "Upcycled Office Chair",
                price: 89.0,
                co2_percent: 35.0,
                reason: "Made from recycled materials",
            },
            AlternativeSeed {
                name: "Wooden Sustainable Chair",
                price: 179.0,
                co2_percent: 28.0,
                reason: "FSC-certified wood from sustainable forests",
            },
        ],
    },
    CategorySeed {
        keyword: "table",
        alternatives: &[
            AlternativeSeed {
                name: "Reclaimed Wood Table",
                price: 249.0,
                co2_percent: 42.0,
                reason: "Reclaimed wood reduces deforestation",
            },
            AlternativeSeed {
                name: "Bamboo Dining Table",
                price: 199.0,
                co2_percent: 38.0,
                reason: "Bamboo is highly renewable and durable",
            },
        ],
    },
    CategorySeed {
        keyword: "laptop",
        alternatives: &[AlternativeSeed {
            name: "Certified Refurbished Laptop",
            price: 599.0,
            co2_percent: 85.0,
            reason: "Refurbished saves up to 85% in manufacturing emissions",
        }],
    },
    CategorySeed {
        keyword: "clothing",
        alternatives: &[
            AlternativeSeed {
                name: "Organic Cotton Shirt",
                price: 45.0,
                co2_percent: 12.0,
                reason: "Organic cotton uses 91% less water",
            },
            AlternativeSeed {
                name: "Recycled Polyester Jacket",
                price: 89.0,
                co2_percent: 18.0,
                reason: "Made from recycled plastic bottles",
            },
        ],
    },
];

/// Generic suggestions served when no category matches. Deliberately
/// non-numeric price and co2 fields; the engine must cope with both.
#[derive(Debug, Clone, Copy)]
struct GenericSeed {
    name: &'static str,
    price_label: &'static str,
    co2_text: &'static str,
    reason: &'static str,
}

impl GenericSeed {
    fn to_record(self) -> AlternativeRecord {
        AlternativeRecord::new(self.name, Price::Label(self.price_label.to_owned()))
            .with_co2_savings(Co2Savings::Text(self.co2_text.to_owned()))
            .with_reason(self.reason)
    }
}

const GENERIC_SEEDS: &[GenericSeed] = &[
    GenericSeed {
        name: "Refurbished/Pre-owned Option",
        price_label: "Contact seller",
        co2_text: "50-70%",
        reason: "Extending product life reduces eco impact",
    },
    GenericSeed {
        name: "Rental Service",
        price_label: "Variable",
        co2_text: "60-80%",
        reason: "Sharing reduces manufacturing demand",
    },
];

/// Fixed in-memory catalog of curated sustainable alternatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Number of curated categories, for readiness reporting.
    pub fn category_count(&self) -> usize {
        CATEGORY_SEEDS.len()
    }

    fn matching_category(product_name: &str) -> Option<&'static CategorySeed> {
        let lowered = product_name.to_lowercase();
        CATEGORY_SEEDS.iter().find(|seed| lowered.contains(seed.keyword))
    }
}

#[async_trait]
impl AlternativesCatalog for StaticCatalog {
    async fn find_alternatives(
        &self,
        query: &ProductQuery,
    ) -> CatalogResult<Vec<AlternativeRecord>> {
        let records = match Self::matching_category(query.as_str()) {
            Some(category) => category
                .alternatives
                .iter()
                .take(MAX_ALTERNATIVES)
                .map(|seed| seed.to_record())
                .collect(),
            None => GENERIC_SEEDS.iter().map(|seed| seed.to_record()).collect(),
        };

        Ok(records)
    }
}
