//! Credit-records lookups behind the profile-provider seam

use async_trait::async_trait;

use crate::errors::DomainError;
use crate::personalize::{Location, ScoreTier, UserProfile};

/// Result type for credit operations
pub type CreditResult<T> = Result<T, DomainError>;

/// Provenance marker for profiles produced by [`MockCreditBureau`].
pub const MOCK_DATA_SOURCE: &str = "mock";

/// Sanitized profile plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLookup {
    pub profile: UserProfile,
    pub data_source: &'static str,
}

/// Affordability profile source keyed by shopper identity. Implementations
/// return `Ok(None)` for unknown identities; errors are reserved for
/// transport or upstream failures.
#[async_trait]
pub trait ProfileProvider: Send + Sync {
    async fn lookup_by_name_dob(
        &self,
        name: &str,
        dob: &str,
    ) -> CreditResult<Option<ProfileLookup>>;

    async fn lookup_by_email(&self, email: &str) -> CreditResult<Option<ProfileLookup>>;
}

/// Full bureau record as an upstream credit-records API would return it.
/// Only the sanitized form ever crosses the provider boundary; see
/// [`CreditRecord::sanitize`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreditRecord {
    pub tier: ScoreTier,
    pub credit_score: u16,
    pub payment_history: String,
    pub debt_to_income: u8,
    pub availability_score: u8,
    pub address: Location,
}

impl CreditRecord {
    /// Strip everything a client has no business seeing. Raw score,
    /// payment history, and debt ratio stay on this side of the seam.
    pub fn sanitize(self) -> UserProfile {
        UserProfile {
            score_tier: self.tier,
            price_range: Some(self.tier.recommended_range()),
            location: Some(self.address),
            availability: Some(self.availability_score),
        }
    }
}

/// Deterministic stand-in for a credit-records service. The same
/// identifying string always produces the same record, which keeps the
/// extension's behavior reproducible without any upstream dependency.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCreditBureau;

impl MockCreditBureau {
    pub fn new() -> Self {
        Self
    }

    /// Record for the name-and-DOB path. Score and debt figures jitter
    /// with the identity bucket so distinct names read as distinct
    /// consumers.
    pub fn record_for_name(&self, name: &str) -> CreditRecord {
        let bucket = identity_bucket(name);
        let tier = tier_for_bucket(bucket);
        let (credit_score, debt_to_income) = match tier {
            ScoreTier::Excellent => (750 + (bucket % 50) as u16, 10 + (bucket % 15) as u8),
            ScoreTier::Good => (670 + (bucket % 70) as u16, 25 + (bucket % 20) as u8),
            ScoreTier::Fair => (580 + (bucket % 80) as u16, 45 + (bucket % 25) as u8),
            ScoreTier::Poor => (300 + (bucket % 280) as u16, 70 + (bucket % 30) as u8),
        };

        CreditRecord {
            tier,
            credit_score,
            payment_history: tier.as_str().to_owned(),
            debt_to_income,
            availability_score: availability_for_tier(tier),
            address: mock_address(bucket),
        }
    }

    /// Record for the email path. Fixed representative figures per tier.
    pub fn record_for_email(&self, email: &str) -> CreditRecord {
        let bucket = identity_bucket(email);
        let tier = tier_for_bucket(bucket);
        let (credit_score, debt_to_income) = match tier {
            ScoreTier::Excellent => (770, 15),
            ScoreTier::Good => (700, 35),
            ScoreTier::Fair => (620, 55),
            ScoreTier::Poor => (450, 85),
        };

        CreditRecord {
            tier,
            credit_score,
            payment_history: tier.as_str().to_owned(),
            debt_to_income,
            availability_score: availability_for_tier(tier),
            address: mock_address(bucket),
        }
    }
}

#[async_trait]
impl ProfileProvider for MockCreditBureau {
    async fn lookup_by_name_dob(
        &self,
        name: &str,
        _dob: &str,
    ) -> CreditResult<Option<ProfileLookup>> {
        // The mock keys on the name alone; DOB rides along for real providers.
        let record = self.record_for_name(name);
        Ok(Some(ProfileLookup { profile: record.sanitize(), data_source: MOCK_DATA_SOURCE }))
    }

    async fn lookup_by_email(&self, email: &str) -> CreditResult<Option<ProfileLookup>> {
        let record = self.record_for_email(email);
        Ok(Some(ProfileLookup { profile: record.sanitize(), data_source: MOCK_DATA_SOURCE }))
    }
}

/// Stable 0..100 bucket for an identifying string. Stability across runs
/// and platforms is the only requirement; blake3 gives us that cheaply.
fn identity_bucket(identity: &str) -> u64 {
    let digest = blake3::hash(identity.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix) % 100
}

fn tier_for_bucket(bucket: u64) -> ScoreTier {
    ScoreTier::ORDERED[((bucket / 25) % 4) as usize]
}

fn availability_for_tier(tier: ScoreTier) -> u8 {
    match tier {
        ScoreTier::Excellent => 95,
        ScoreTier::Good => 85,
        ScoreTier::Fair => 70,
        ScoreTier::Poor => 50,
    }
}

fn mock_address(bucket: u64) -> Location {
    Location {
        city: "Mock City".to_owned(),
        state: "MC".to_owned(),
        zip: format!("{:05}", (bucket * 13337) % 90000),
    }
}
