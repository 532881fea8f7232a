// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    compatibility_score, Analysis, AstrologicalDetails, BirthDetails, CompatibilityLevel,
    CompatibilityResult, Coordinates, FormattedMatch, Gender, KootDetails, MatchRecord,
    MatchStatistics, NakshatraDetails, Profile, RashiDetails, ReportSummary, TierThresholds,
};
pub use requests::{FindMatchesRequest, FormatResultsRequest, KundliMatchRequest, ProfileRequest, RegisterProfileRequest};
pub use responses::{AgentError, ErrorResponse, HealthResponse};
