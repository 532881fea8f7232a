use crate::core::tiers::Tier;
use crate::models::{FormattedMatch, TierThresholds};

/// Select which of the score-sorted matches to surface
///
/// Up to `max_surfaced` good matches if there are any, otherwise up to
/// `max_surfaced` moderate ones, otherwise only the single best low match.
/// Input order is kept within the returned tier.
pub fn filter_best_matches(
    matches: Vec<FormattedMatch>,
    thresholds: &TierThresholds,
) -> Vec<FormattedMatch> {
    let mut good = Vec::new();
    let mut moderate = Vec::new();
    let mut low = Vec::new();

    for m in matches {
        match thresholds.tier(m.compatibility_score) {
            Tier::Good => good.push(m),
            Tier::Moderate => moderate.push(m),
            Tier::Low => low.push(m),
        }
    }

    if !good.is_empty() {
        good.truncate(thresholds.max_surfaced);
        return good;
    }

    if !moderate.is_empty() {
        moderate.truncate(thresholds.max_surfaced);
        return moderate;
    }

    // Never more than one poor match
    low.truncate(1);
    low
}
