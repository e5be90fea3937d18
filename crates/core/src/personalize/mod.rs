//! Profile-driven personalization of sustainable alternatives
//!
//! Filters candidate listings by affordability, falls back gracefully when
//! nothing survives, ranks by environmental impact then price, and badges
//! the top picks.

mod engine;
mod types;

pub use engine::PersonalizationEngine;
pub use types::{
    AlternativeRecord, Co2Savings, Location, Price, PriceRange, ScoreTier, UserProfile,
};

/// Maximum alternatives returned to a caller
pub const MAX_ALTERNATIVES: usize = 5;

/// How many unfiltered candidates the empty-result fallback keeps
pub const FALLBACK_SHORTLIST: usize = 3;

/// Highest tier priority that still sees listings without a numeric price
pub const OPAQUE_PRICE_MAX_PRIORITY: u8 = 2;

/// Badge for the top-ranked alternative
pub const TOP_PICK_BADGE: &str = "Recommended for you";

/// Badge for the runner-up
pub const RUNNER_UP_BADGE: &str = "Also great choice";

/// Note attached when filtering removed every candidate
pub const FALLBACK_NOTE: &str = "Outside your typical price range";
