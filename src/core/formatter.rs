use chrono::{Datelike, NaiveDate, Utc};
use crate::models::{FormattedMatch, MatchRecord, Profile, ReportSummary, TierThresholds};
use crate::core::{
    analysis::analyze_compatibility_results,
    astro::{extract_astrological_details, message_description},
    filters::filter_best_matches,
    tiers::compatibility_level,
};

/// Turns scored candidates into the final matchmaking report
///
/// # Pipeline Stages
/// 1. Per-candidate transform (age, level, description, astrological details)
/// 2. Stable sort by compatibility score, highest first
/// 3. Tiered filter
/// 4. Aggregate analysis over the surfaced matches
///
/// Never fails: malformed candidate data degrades to defaults.
#[derive(Debug, Clone)]
pub struct ResultsFormatter {
    thresholds: TierThresholds,
}

impl ResultsFormatter {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn with_default_thresholds() -> Self {
        Self {
            thresholds: TierThresholds::default(),
        }
    }

    /// Build the report, computing ages against the current year
    pub fn format_results(
        &self,
        records: Vec<MatchRecord>,
        user_profile: Option<Profile>,
    ) -> ReportSummary {
        self.format_results_in_year(records, user_profile, Utc::now().year())
    }

    /// Build the report with ages computed against `current_year`
    pub fn format_results_in_year(
        &self,
        records: Vec<MatchRecord>,
        user_profile: Option<Profile>,
        current_year: i32,
    ) -> ReportSummary {
        let mut formatted: Vec<FormattedMatch> = records
            .into_iter()
            .map(|record| self.format_match(record, current_year))
            .collect();

        // sort_by is stable: equal scores keep input order
        formatted.sort_by(|a, b| b.compatibility_score.cmp(&a.compatibility_score));

        let matches = filter_best_matches(formatted, &self.thresholds);
        let analysis = analyze_compatibility_results(&matches, &self.thresholds);

        ReportSummary {
            user_profile,
            total_matches: matches.len(),
            best_match: matches.first().cloned(),
            matches,
            analysis,
        }
    }

    fn format_match(&self, record: MatchRecord, current_year: i32) -> FormattedMatch {
        let MatchRecord { candidate, compatibility } = record;

        let level = compatibility_level(
            compatibility.compatibility_score,
            &compatibility.message_type,
            &self.thresholds,
        );
        let description = message_description(&compatibility);
        let details = extract_astrological_details(&compatibility.raw_response, candidate.gender);

        FormattedMatch {
            id: candidate.id.unwrap_or_default(),
            name: or_unknown(candidate.name),
            age: age_in_year(&candidate.dob, current_year),
            location: or_unknown(candidate.place),
            occupation: or_unknown(candidate.occupation),
            dob: candidate.dob,
            tob: candidate.tob,
            gender: candidate.gender,
            compatibility_score: compatibility.compatibility_score,
            compatibility_level: level,
            message_type: compatibility.message_type,
            message_description: description,
            total_points: compatibility.total_points,
            maximum_points: compatibility.maximum_points,
            raw_response: compatibility.raw_response,
            astrological_details: details,
        }
    }
}

impl Default for ResultsFormatter {
    fn default() -> Self {
        Self::with_default_thresholds()
    }
}

/// Age as a plain difference of years; month and day are ignored
///
/// Returns 0 when `dob` is not a `YYYY-MM-DD` date.
pub fn age_in_year(dob: &str, current_year: i32) -> i32 {
    NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d")
        .map(|date| current_year - date.year())
        .unwrap_or(0)
}

fn or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        "Unknown".to_string()
    } else {
        value
    }
}
