use crate::models::{domain::MESSAGE_TYPE_NOT_PREFERABLE, CompatibilityLevel, TierThresholds};

/// Score bucket used for batch filtering and statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Good,
    Moderate,
    Low,
}

impl TierThresholds {
    /// Bucket a score; message type plays no part here
    #[inline]
    pub fn tier(&self, score: u8) -> Tier {
        if score >= self.good {
            Tier::Good
        } else if score >= self.moderate {
            Tier::Moderate
        } else {
            Tier::Low
        }
    }
}

/// Display label for one candidate
///
/// A `not-preferable` verdict from the provider wins over any score.
pub fn compatibility_level(
    score: u8,
    message_type: &str,
    thresholds: &TierThresholds,
) -> CompatibilityLevel {
    if message_type == MESSAGE_TYPE_NOT_PREFERABLE {
        return CompatibilityLevel::NotRecommended;
    }

    match thresholds.tier(score) {
        Tier::Good => CompatibilityLevel::Good,
        Tier::Moderate => CompatibilityLevel::Moderate,
        Tier::Low => CompatibilityLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.tier(100), Tier::Good);
        assert_eq!(thresholds.tier(70), Tier::Good);
        assert_eq!(thresholds.tier(69), Tier::Moderate);
        assert_eq!(thresholds.tier(50), Tier::Moderate);
        assert_eq!(thresholds.tier(49), Tier::Low);
        assert_eq!(thresholds.tier(0), Tier::Low);
    }

    #[test]
    fn test_not_preferable_takes_precedence() {
        let thresholds = TierThresholds::default();
        assert_eq!(
            compatibility_level(95, "not-preferable", &thresholds),
            CompatibilityLevel::NotRecommended
        );
        assert_eq!(
            compatibility_level(20, "not-preferable", &thresholds),
            CompatibilityLevel::NotRecommended
        );
    }

    #[test]
    fn test_levels_by_score() {
        let thresholds = TierThresholds::default();
        assert_eq!(compatibility_level(70, "auspicious", &thresholds), CompatibilityLevel::Good);
        assert_eq!(compatibility_level(55, "neutral", &thresholds), CompatibilityLevel::Moderate);
        assert_eq!(compatibility_level(0, "error", &thresholds), CompatibilityLevel::Low);
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = TierThresholds { good: 80, moderate: 60, max_surfaced: 3 };
        assert_eq!(compatibility_level(75, "neutral", &thresholds), CompatibilityLevel::Moderate);
        assert_eq!(thresholds.tier(59), Tier::Low);
    }
}
