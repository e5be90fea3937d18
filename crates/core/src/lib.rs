pub mod catalog;
pub mod config;
pub mod credit;
pub mod errors;
pub mod personalize;

pub use catalog::{AlternativesCatalog, CatalogResult, ProductQuery, StaticCatalog};
pub use config::{
    AppConfig, ConfigError, ConfigOverrides, CreditConfig, LoadOptions, LogFormat, LoggingConfig,
    ServerConfig, StoreConfig,
};
pub use credit::{
    CreditRecord, CreditResult, MockCreditBureau, ProfileLookup, ProfileProvider, MOCK_DATA_SOURCE,
};
pub use errors::DomainError;
pub use personalize::{
    AlternativeRecord, Co2Savings, Location, PersonalizationEngine, Price, PriceRange, ScoreTier,
    UserProfile, FALLBACK_NOTE, MAX_ALTERNATIVES, RUNNER_UP_BADGE, TOP_PICK_BADGE,
};
