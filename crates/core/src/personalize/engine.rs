//! Personalization ranking pipeline

use super::types::{AlternativeRecord, UserProfile};
use super::{
    FALLBACK_NOTE, FALLBACK_SHORTLIST, MAX_ALTERNATIVES, OPAQUE_PRICE_MAX_PRIORITY,
    RUNNER_UP_BADGE, TOP_PICK_BADGE,
};

/// Filters, ranks, and annotates alternative listings for one shopper.
///
/// Stateless and side-effect free; every call is an independent transform
/// over its inputs and may run on any worker without coordination.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersonalizationEngine;

impl PersonalizationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Produce at most [`MAX_ALTERNATIVES`] listings for the shopper.
    ///
    /// Without a profile the candidates pass through untouched apart from
    /// the length cap. With one: affordability filter, fallback to the
    /// leading originals when the filter empties the list, rank by CO2
    /// savings then price, badge the top two.
    pub fn rank(
        &self,
        candidates: Vec<AlternativeRecord>,
        profile: Option<&UserProfile>,
    ) -> Vec<AlternativeRecord> {
        let Some(profile) = profile else {
            let mut unranked = candidates;
            unranked.truncate(MAX_ALTERNATIVES);
            return unranked;
        };

        let mut shortlist = affordable_shortlist(&candidates, profile);
        if shortlist.is_empty() && !candidates.is_empty() {
            shortlist = fallback_shortlist(candidates);
        }

        rank_by_impact(&mut shortlist);
        apply_badges(&mut shortlist);
        shortlist.truncate(MAX_ALTERNATIVES);
        shortlist
    }
}

/// Affordability filter, preserving candidate order.
///
/// The tier priority gates only listings without a numeric price; numeric
/// prices answer to the recommended range alone, and a half-known range
/// (one bound missing) constrains nothing.
fn affordable_shortlist(
    candidates: &[AlternativeRecord],
    profile: &UserProfile,
) -> Vec<AlternativeRecord> {
    let priority = profile.score_tier.priority();
    let bounds = profile.price_range.as_ref().and_then(|range| range.bounds());

    candidates
        .iter()
        .filter(|candidate| match candidate.price.amount() {
            None => priority <= OPAQUE_PRICE_MAX_PRIORITY,
            Some(amount) => match bounds {
                Some((min, max)) => min <= amount && amount <= max,
                None => true,
            },
        })
        .cloned()
        .collect()
}

/// First few originals, unfiltered and in original order, flagged as
/// outside the shopper's band.
fn fallback_shortlist(candidates: Vec<AlternativeRecord>) -> Vec<AlternativeRecord> {
    candidates
        .into_iter()
        .take(FALLBACK_SHORTLIST)
        .map(|mut candidate| {
            candidate.note = Some(FALLBACK_NOTE.to_owned());
            candidate
        })
        .collect()
}

/// Highest CO2 savings first; ties break toward the cheaper listing, and
/// label-priced listings sink to the end of their CO2 band. Stable, so
/// fully tied listings keep their incoming order.
fn rank_by_impact(shortlist: &mut [AlternativeRecord]) {
    shortlist.sort_by(|a, b| {
        b.co2_savings
            .magnitude()
            .total_cmp(&a.co2_savings.magnitude())
            .then_with(|| a.price.sort_value().total_cmp(&b.price.sort_value()))
    });
}

/// Badge the top two positions and clear anything stale further down.
fn apply_badges(shortlist: &mut [AlternativeRecord]) {
    for (position, candidate) in shortlist.iter_mut().enumerate() {
        candidate.badge = match position {
            0 => Some(TOP_PICK_BADGE.to_owned()),
            1 => Some(RUNNER_UP_BADGE.to_owned()),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use crate::personalize::types::{Co2Savings, Price, ScoreTier};

    use super::*;

    fn listing(name: &str, price: Price, co2: &str) -> AlternativeRecord {
        AlternativeRecord::new(name, price)
            .with_co2_savings(Co2Savings::Text(co2.to_owned()))
            .with_reason("test listing")
    }

    fn scenario_candidates() -> Vec<AlternativeRecord> {
        vec![
            listing("Mid", Price::Amount(100.0), "30%"),
            listing("Cheap", Price::Amount(50.0), "50%"),
            listing("Opaque", Price::Label("Contact seller".to_owned()), "10%"),
        ]
    }

    #[test]
    fn good_tier_keeps_numeric_candidates_in_range() {
        let engine = PersonalizationEngine::new();
        let profile = UserProfile::new(ScoreTier::Good).with_price_range(0.0, 1000.0);

        let ranked = engine.rank(scenario_candidates(), Some(&profile));

        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["Cheap", "Mid"]);
        assert_eq!(ranked[0].badge.as_deref(), Some(TOP_PICK_BADGE));
        assert_eq!(ranked[1].badge.as_deref(), Some(RUNNER_UP_BADGE));
        assert!(ranked.iter().all(|record| record.note.is_none()));
    }

    #[test]
    fn poor_tier_keeps_only_the_opaque_price_listing() {
        let engine = PersonalizationEngine::new();
        let profile = UserProfile::new(ScoreTier::Poor).with_price_range(0.0, 10.0);

        let ranked = engine.rank(scenario_candidates(), Some(&profile));

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "Opaque");
        assert_eq!(ranked[0].badge.as_deref(), Some(TOP_PICK_BADGE));
        assert!(ranked[0].note.is_none());
    }

    #[test]
    fn excellent_tier_out_of_range_falls_back_to_leading_candidates() {
        let engine = PersonalizationEngine::new();
        let profile = UserProfile::new(ScoreTier::Excellent).with_price_range(1000.0, 2000.0);

        let ranked = engine.rank(scenario_candidates(), Some(&profile));

        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|record| record.note.as_deref() == Some(FALLBACK_NOTE)));

        // Still ranked by CO2 savings after the fallback fires.
        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["Cheap", "Mid", "Opaque"]);
        assert_eq!(ranked[0].badge.as_deref(), Some(TOP_PICK_BADGE));
        assert_eq!(ranked[1].badge.as_deref(), Some(RUNNER_UP_BADGE));
        assert!(ranked[2].badge.is_none());
    }

    #[test]
    fn empty_candidates_never_trigger_the_fallback() {
        let engine = PersonalizationEngine::new();
        let profile = UserProfile::new(ScoreTier::Excellent).with_price_range(1000.0, 2000.0);

        assert!(engine.rank(Vec::new(), Some(&profile)).is_empty());
        assert!(engine.rank(Vec::new(), None).is_empty());
    }

    #[test]
    fn output_is_capped_with_and_without_a_profile() {
        let engine = PersonalizationEngine::new();
        let candidates: Vec<AlternativeRecord> = (0..8)
            .map(|index| {
                listing(&format!("listing-{index}"), Price::Amount(20.0 + index as f64), "25%")
            })
            .collect();

        let profile = UserProfile::new(ScoreTier::Good);
        assert_eq!(engine.rank(candidates.clone(), Some(&profile)).len(), MAX_ALTERNATIVES);
        assert_eq!(engine.rank(candidates, None).len(), MAX_ALTERNATIVES);
    }

    #[test]
    fn missing_profile_passes_candidates_through_unannotated() {
        let engine = PersonalizationEngine::new();

        let ranked = engine.rank(scenario_candidates(), None);

        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["Mid", "Cheap", "Opaque"]);
        assert!(ranked.iter().all(|record| record.badge.is_none() && record.note.is_none()));
    }

    #[test]
    fn ranking_orders_by_co2_then_price() {
        let engine = PersonalizationEngine::new();
        let candidates = vec![
            listing("low-co2", Price::Amount(10.0), "5%"),
            listing("tied-expensive", Price::Amount(400.0), "40%"),
            listing("tied-cheap", Price::Amount(100.0), "40%"),
            listing("best", Price::Amount(900.0), "80%"),
        ];
        let profile = UserProfile::new(ScoreTier::Good);

        let ranked = engine.rank(candidates, Some(&profile));

        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["best", "tied-cheap", "tied-expensive", "low-co2"]);

        for pair in ranked.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let co2_first = first.co2_savings.magnitude();
            let co2_second = second.co2_savings.magnitude();
            assert!(co2_first >= co2_second);
            if co2_first == co2_second {
                assert!(first.price.sort_value() <= second.price.sort_value());
            }
        }
    }

    #[test]
    fn opaque_prices_sink_within_their_co2_band() {
        let engine = PersonalizationEngine::new();
        let candidates = vec![
            listing("opaque", Price::Label("Variable".to_owned()), "40%"),
            listing("numeric", Price::Amount(250.0), "40%"),
        ];
        let profile = UserProfile::new(ScoreTier::Poor);

        let ranked = engine.rank(candidates, Some(&profile));

        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["numeric", "opaque"]);
    }

    #[test]
    fn fallback_selection_preserves_original_order() {
        let engine = PersonalizationEngine::new();
        // Fully tied so the stable sort cannot reorder the selection.
        let candidates = vec![
            listing("first", Price::Amount(5000.0), "20%"),
            listing("second", Price::Amount(5000.0), "20%"),
            listing("third", Price::Amount(5000.0), "20%"),
            listing("fourth", Price::Amount(5000.0), "20%"),
        ];
        let profile = UserProfile::new(ScoreTier::Good).with_price_range(0.0, 100.0);

        let ranked = engine.rank(candidates, Some(&profile));

        let names: Vec<&str> = ranked.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn stale_badges_are_cleared_below_the_top_two() {
        let engine = PersonalizationEngine::new();
        let mut carried = listing("carried", Price::Amount(30.0), "5%");
        carried.badge = Some("stale".to_owned());
        let candidates = vec![
            listing("a", Price::Amount(10.0), "50%"),
            listing("b", Price::Amount(20.0), "40%"),
            carried,
        ];
        let profile = UserProfile::new(ScoreTier::Good);

        let ranked = engine.rank(candidates, Some(&profile));

        assert_eq!(ranked[2].name, "carried");
        assert!(ranked[2].badge.is_none());
    }

    #[test]
    fn half_open_range_does_not_constrain_numeric_prices() {
        let engine = PersonalizationEngine::new();
        let mut profile = UserProfile::new(ScoreTier::Good);
        profile.price_range =
            Some(crate::personalize::types::PriceRange { min: Some(0.0), max: None });

        let candidates = vec![listing("pricey", Price::Amount(99_999.0), "10%")];
        let ranked = engine.rank(candidates, Some(&profile));

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "pricey");
    }

    #[test]
    fn tier_priority_gates_opaque_prices_only() {
        let engine = PersonalizationEngine::new();
        let candidates = vec![listing("opaque", Price::Label("Contact seller".to_owned()), "10%")];

        for (tier, kept) in [
            (ScoreTier::Excellent, false),
            (ScoreTier::Good, false),
            (ScoreTier::Fair, true),
            (ScoreTier::Poor, true),
        ] {
            let profile = UserProfile::new(tier);
            let ranked = engine.rank(candidates.clone(), Some(&profile));
            // A dropped opaque listing resurfaces through the fallback, noted.
            if kept {
                assert!(ranked[0].note.is_none(), "{tier:?} should keep the listing directly");
            } else {
                assert_eq!(
                    ranked[0].note.as_deref(),
                    Some(FALLBACK_NOTE),
                    "{tier:?} should only see the listing via the fallback"
                );
            }
        }
    }
}
