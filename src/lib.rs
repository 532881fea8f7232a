//! MatchMyStar - astrology-based matchmaking service
//!
//! Geocodes a user's birthplace, pulls opposite-gender candidates from the
//! profile store, scores each pairing through Prokerala kundli matching and
//! turns the scored list into a ranked, filtered report.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{filter_best_matches, ResultsFormatter};
pub use crate::models::{
    CompatibilityResult, FormattedMatch, Gender, MatchRecord, Profile, ReportSummary, TierThresholds,
};
pub use crate::services::MatchmakingPipeline;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let report = ResultsFormatter::with_default_thresholds().format_results(Vec::new(), None);
        assert_eq!(report.total_matches, 0);
        assert_eq!(report.analysis.overall_assessment, "No matches found");
    }
}
