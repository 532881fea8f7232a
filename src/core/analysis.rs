use crate::core::tiers::Tier;
use crate::models::{Analysis, FormattedMatch, MatchStatistics, TierThresholds};

/// Summarize the surfaced matches into statistics and recommendation text
pub fn analyze_compatibility_results(
    matches: &[FormattedMatch],
    thresholds: &TierThresholds,
) -> Analysis {
    if matches.is_empty() {
        return Analysis {
            overall_assessment: "No matches found".to_string(),
            recommendation: "Try adjusting your search criteria or adding more profiles to the database."
                .to_string(),
            filtering_message: None,
            statistics: None,
            message: "We couldn't find any compatible matches in our database.".to_string(),
        };
    }

    let statistics = calculate_statistics(matches, thresholds);
    let cap = thresholds.max_surfaced;

    let (overall_assessment, recommendation, filtering_message) = if statistics.good_matches > 0 {
        (
            format!("Found {} good match(es)", statistics.good_matches),
            "You have some compatible matches. Consider these top choices.".to_string(),
            format!(
                "Showing top {} good matches out of available profiles.",
                statistics.good_matches.min(cap)
            ),
        )
    } else if statistics.moderate_matches > 0 {
        (
            format!("Found {} moderate match(es)", statistics.moderate_matches),
            "Some matches show potential. Consider consulting an astrologer for guidance.".to_string(),
            format!(
                "Showing top {} moderate matches out of available profiles.",
                statistics.moderate_matches.min(cap)
            ),
        )
    } else {
        (
            "Limited compatibility found".to_string(),
            "The available matches have low compatibility. Consider consulting an astrologer."
                .to_string(),
            "Showing the best available match despite low compatibility.".to_string(),
        )
    };

    let message = analysis_message(statistics.highest_score, thresholds);

    Analysis {
        overall_assessment,
        recommendation,
        filtering_message: Some(filtering_message),
        statistics: Some(statistics),
        message,
    }
}

fn calculate_statistics(matches: &[FormattedMatch], thresholds: &TierThresholds) -> MatchStatistics {
    let total: u32 = matches.iter().map(|m| u32::from(m.compatibility_score)).sum();
    let average = total as f64 / matches.len() as f64;

    let mut statistics = MatchStatistics {
        total_matches: matches.len(),
        // Ties go to the even digit: 72.25 -> 72.2
        average_score: (average * 10.0).round_ties_even() / 10.0,
        highest_score: matches.iter().map(|m| m.compatibility_score).max().unwrap_or(0),
        lowest_score: matches.iter().map(|m| m.compatibility_score).min().unwrap_or(0),
        good_matches: 0,
        moderate_matches: 0,
        low_matches: 0,
    };

    for m in matches {
        match thresholds.tier(m.compatibility_score) {
            Tier::Good => statistics.good_matches += 1,
            Tier::Moderate => statistics.moderate_matches += 1,
            Tier::Low => statistics.low_matches += 1,
        }
    }

    statistics
}

/// One-line headline keyed by the best score
pub fn analysis_message(highest_score: u8, thresholds: &TierThresholds) -> String {
    match thresholds.tier(highest_score) {
        Tier::Good => format!("Your best match has a {}% compatibility score.", highest_score),
        Tier::Moderate => format!("Your best match shows {}% compatibility.", highest_score),
        Tier::Low => format!(
            "Your best match shows {}% compatibility. Consider consulting an astrologer for guidance.",
            highest_score
        ),
    }
}
