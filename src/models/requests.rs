use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{MatchRecord, Profile};

/// Request carrying a single user profile (astro-data, geocode, filter-profiles agents)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(nested)]
    pub user_profile: Profile,
}

/// Request to score a user against a list of candidates
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct KundliMatchRequest {
    #[validate(nested)]
    pub user_profile: Profile,
    #[serde(default)]
    pub candidates: Vec<Profile>,
    #[validate(range(min = 1, max = 32))]
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// Request to format scored candidates into a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatResultsRequest {
    #[serde(default)]
    pub compatibility_results: Vec<MatchRecord>,
    #[serde(default)]
    pub user_profile: Option<Profile>,
}

/// Request to run the whole matchmaking pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    #[validate(nested)]
    pub user_profile: Profile,
    #[validate(range(min = 1, max = 32))]
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

/// Request to register a candidate profile in the store
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterProfileRequest {
    #[validate(nested)]
    pub profile: Profile,
}
