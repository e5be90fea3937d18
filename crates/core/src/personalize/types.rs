//! Types for the personalization pipeline

use serde::{Deserialize, Serialize};

/// Listing price as marketplace data actually carries it. Sellers often
/// publish text instead of a number ("Contact seller", "Variable").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Label(String),
}

impl Price {
    /// Numeric amount, when the listing has one.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(value) => Some(*value),
            Price::Label(_) => None,
        }
    }

    /// Sort key that sinks label-priced listings below every numeric price.
    pub fn sort_value(&self) -> f64 {
        self.amount().unwrap_or(f64::INFINITY)
    }
}

/// Claimed CO2 savings for an alternative. Upstream data mixes bare numbers
/// with unit-decorated strings ("45%", "12kg CO2", "50-70%").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Co2Savings {
    Amount(f64),
    Text(String),
}

impl Default for Co2Savings {
    fn default() -> Self {
        Co2Savings::Amount(0.0)
    }
}

impl Co2Savings {
    /// Comparable numeric magnitude. Strips percent and kg-CO2 markers and
    /// surrounding whitespace; anything still unparsable ranks as zero.
    pub fn magnitude(&self) -> f64 {
        match self {
            Co2Savings::Amount(value) => *value,
            Co2Savings::Text(raw) => parse_magnitude(raw),
        }
    }
}

fn parse_magnitude(raw: &str) -> f64 {
    let mut cleaned = raw.to_lowercase();
    for token in ["kg co₂", "kg co2", "kgco2", "%"] {
        cleaned = cleaned.replace(token, "");
    }
    cleaned.trim().parse().unwrap_or(0.0)
}

/// A sustainable alternative listing offered to the shopper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeRecord {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub co2_savings: Co2Savings,
    #[serde(default)]
    pub reason: String,
    /// Set by the engine when the empty-result fallback fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Set by the engine on the top-ranked entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

impl AlternativeRecord {
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
            co2_savings: Co2Savings::default(),
            reason: String::new(),
            note: None,
            badge: None,
        }
    }

    pub fn with_co2_savings(mut self, co2_savings: Co2Savings) -> Self {
        self.co2_savings = co2_savings;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// Coarse credit-worthiness bucket driving affordability assumptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    /// Tier order the mock bureau indexes into.
    pub const ORDERED: [ScoreTier; 4] =
        [ScoreTier::Excellent, ScoreTier::Good, ScoreTier::Fair, ScoreTier::Poor];

    /// Filter priority. Gates only listings without a numeric price; it is
    /// deliberately absent from the sort key and from numeric filtering.
    pub fn priority(self) -> u8 {
        match self {
            ScoreTier::Excellent => 4,
            ScoreTier::Good => 3,
            ScoreTier::Fair => 2,
            ScoreTier::Poor => 1,
        }
    }

    /// Spending band recommended for the tier.
    pub fn recommended_range(self) -> PriceRange {
        let (min, max) = match self {
            ScoreTier::Excellent => (100.0, 5000.0),
            ScoreTier::Good => (50.0, 2000.0),
            ScoreTier::Fair => (20.0, 800.0),
            ScoreTier::Poor => (10.0, 300.0),
        };
        PriceRange { min: Some(min), max: Some(max) }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreTier::Excellent => "excellent",
            ScoreTier::Good => "good",
            ScoreTier::Fair => "fair",
            ScoreTier::Poor => "poor",
        }
    }

    fn from_name(raw: &str) -> Self {
        // Unknown tiers read as good rather than failing the request.
        match raw.trim().to_ascii_lowercase().as_str() {
            "excellent" => ScoreTier::Excellent,
            "good" => ScoreTier::Good,
            "fair" => ScoreTier::Fair,
            "poor" => ScoreTier::Poor,
            _ => ScoreTier::Good,
        }
    }
}

impl<'de> Deserialize<'de> for ScoreTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ScoreTier::from_name(&raw))
    }
}

/// Recommended spending band. Either bound may be absent; filtering only
/// applies when both are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Sanitized affordability profile as released by a profile provider. Raw
/// bureau internals (score, payment history, debt ratio) never appear here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub score_tier: ScoreTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<u8>,
}

impl UserProfile {
    /// Create a profile with just a tier.
    pub fn new(score_tier: ScoreTier) -> Self {
        Self { score_tier, ..Self::default() }
    }

    /// Set both range bounds.
    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.price_range = Some(PriceRange { min: Some(min), max: Some(max) });
        self
    }

    /// Set a location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set an availability score.
    pub fn with_availability(mut self, availability: u8) -> Self {
        self.availability = Some(availability);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn price_deserializes_numbers_and_labels() {
        let numeric: Price = serde_json::from_value(json!(399.0)).unwrap();
        assert_eq!(numeric.amount(), Some(399.0));

        let label: Price = serde_json::from_value(json!("Contact seller")).unwrap();
        assert_eq!(label.amount(), None);
        assert_eq!(label, Price::Label("Contact seller".to_owned()));
    }

    #[test]
    fn label_prices_sort_after_any_amount() {
        let label = Price::Label("Variable".to_owned());
        assert!(label.sort_value() > Price::Amount(1e12).sort_value());
    }

    #[test]
    fn co2_magnitude_strips_unit_markers() {
        let cases = [
            (Co2Savings::Amount(65.0), 65.0),
            (Co2Savings::Text("45%".to_owned()), 45.0),
            (Co2Savings::Text(" 45 % ".to_owned()), 45.0),
            (Co2Savings::Text("12kg CO2".to_owned()), 12.0),
            (Co2Savings::Text("12 kg CO₂".to_owned()), 12.0),
            (Co2Savings::Text("50-70%".to_owned()), 0.0),
            (Co2Savings::Text("unknown".to_owned()), 0.0),
            (Co2Savings::default(), 0.0),
        ];

        for (input, expected) in cases {
            assert_eq!(input.magnitude(), expected, "magnitude of {input:?}");
        }
    }

    #[test]
    fn record_without_co2_field_defaults_to_zero() {
        let record: AlternativeRecord =
            serde_json::from_value(json!({"name": "Bike", "price": 120.0})).unwrap();
        assert_eq!(record.co2_savings.magnitude(), 0.0);
        assert!(record.note.is_none());
        assert!(record.badge.is_none());
    }

    #[test]
    fn unset_annotations_are_omitted_from_json() {
        let record = AlternativeRecord::new("Bike", Price::Amount(120.0));
        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("note"));
        assert!(!object.contains_key("badge"));
    }

    #[test]
    fn unknown_score_tier_reads_as_good() {
        let tier: ScoreTier = serde_json::from_value(json!("platinum")).unwrap();
        assert_eq!(tier, ScoreTier::Good);

        let tier: ScoreTier = serde_json::from_value(json!(" EXCELLENT ")).unwrap();
        assert_eq!(tier, ScoreTier::Excellent);
    }

    #[test]
    fn score_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ScoreTier::Poor).unwrap(), json!("poor"));
    }

    #[test]
    fn tier_priorities_match_the_filter_table() {
        assert_eq!(ScoreTier::Excellent.priority(), 4);
        assert_eq!(ScoreTier::Good.priority(), 3);
        assert_eq!(ScoreTier::Fair.priority(), 2);
        assert_eq!(ScoreTier::Poor.priority(), 1);
    }

    #[test]
    fn recommended_ranges_follow_the_tier_table() {
        let cases = [
            (ScoreTier::Excellent, 100.0, 5000.0),
            (ScoreTier::Good, 50.0, 2000.0),
            (ScoreTier::Fair, 20.0, 800.0),
            (ScoreTier::Poor, 10.0, 300.0),
        ];

        for (tier, min, max) in cases {
            assert_eq!(tier.recommended_range().bounds(), Some((min, max)));
        }
    }

    #[test]
    fn half_open_ranges_are_no_constraint() {
        assert_eq!(PriceRange { min: Some(0.0), max: None }.bounds(), None);
        assert_eq!(PriceRange { min: None, max: Some(100.0) }.bounds(), None);
        assert_eq!(PriceRange::default().bounds(), None);
        assert_eq!(PriceRange { min: Some(0.0), max: Some(10.0) }.bounds(), Some((0.0, 10.0)));
    }

    #[test]
    fn profile_missing_tier_defaults_to_good() {
        let profile: UserProfile =
            serde_json::from_value(json!({"price_range": {"min": 0, "max": 10}})).unwrap();
        assert_eq!(profile.score_tier, ScoreTier::Good);
        assert_eq!(profile.price_range.unwrap().bounds(), Some((0.0, 10.0)));
    }
}
