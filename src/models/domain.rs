use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Default maximum on the guna milan point scale
pub const DEFAULT_MAXIMUM_POINTS: f64 = 36.0;

/// Message type the provider uses for pairings it advises against
pub const MESSAGE_TYPE_NOT_PREFERABLE: &str = "not-preferable";

/// Message type carried by records whose lookup failed
pub const MESSAGE_TYPE_ERROR: &str = "error";

/// Profile gender; also selects the provider's `boy_info`/`girl_info` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// The gender candidates are drawn from
    pub fn opposite(self) -> Self {
        match self {
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// A person's identity and birth data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Profile {
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    /// `YYYY-MM-DD`
    #[validate(custom(function = "validate_dob"))]
    #[serde(default, deserialize_with = "deserialize_text")]
    pub dob: String,
    /// `HH:MM`, 24-hour
    #[validate(custom(function = "validate_tob"))]
    #[serde(default, deserialize_with = "deserialize_text")]
    pub tob: String,
    #[validate(length(min = 1))]
    #[serde(default, deserialize_with = "deserialize_text")]
    pub place: String,
    pub gender: Gender,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub occupation: String,
    #[serde(default, deserialize_with = "deserialize_coordinate", skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_coordinate", skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl Profile {
    /// Latitude/longitude pair, if the profile has been geocoded
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }

    /// Copy of this profile carrying the given coordinates
    pub fn with_coordinates(&self, coordinates: Coordinates) -> Self {
        Self {
            lat: Some(coordinates.lat),
            lon: Some(coordinates.lon),
            ..self.clone()
        }
    }

    /// Birth data sent to the compatibility provider
    pub fn birth_details(&self) -> BirthDetails {
        BirthDetails {
            dob: self.dob.clone(),
            tob: self.tob.clone(),
            lat: self.lat,
            lon: self.lon,
            gender: self.gender,
        }
    }
}

fn validate_dob(dob: &str) -> Result<(), ValidationError> {
    chrono::NaiveDate::parse_from_str(dob, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("dob_format"))
}

fn validate_tob(tob: &str) -> Result<(), ValidationError> {
    chrono::NaiveTime::parse_from_str(tob, "%H:%M")
        .map(|_| ())
        .map_err(|_| ValidationError::new("tob_format"))
}

/// Null text columns read as empty strings
fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Store ids may be integers or UUID strings; both are kept as text
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts coordinates as JSON numbers or numeric strings (Nominatim returns strings)
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Decimal-degree coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One party of a compatibility lookup
#[derive(Debug, Clone, PartialEq)]
pub struct BirthDetails {
    pub dob: String,
    pub tob: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub gender: Gender,
}

/// Normalized output of one pairwise kundli comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    #[serde(default)]
    pub compatibility_score: u8,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default = "default_maximum_points")]
    pub maximum_points: f64,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub raw_response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompatibilityResult {
    /// Record for a lookup that did not produce a provider answer
    pub fn failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            compatibility_score: 0,
            total_points: 0.0,
            maximum_points: DEFAULT_MAXIMUM_POINTS,
            message_type: MESSAGE_TYPE_ERROR.to_string(),
            summary: format!("Error: {}", reason),
            raw_response: Value::Object(Default::default()),
            error: Some(reason),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.message_type == MESSAGE_TYPE_ERROR
    }

    /// A record carrying `error` is a failed lookup whatever else it claims:
    /// score 0 and message type `error`
    pub fn normalized(mut self) -> Self {
        if self.error.is_some() {
            self.compatibility_score = 0;
            self.message_type = MESSAGE_TYPE_ERROR.to_string();
        }
        self
    }
}

fn default_maximum_points() -> f64 { DEFAULT_MAXIMUM_POINTS }
fn default_message_type() -> String { "neutral".to_string() }

/// Score out of 100 from the provider's point scale
pub fn compatibility_score(total_points: f64, maximum_points: f64) -> u8 {
    if !(maximum_points > 0.0) || !total_points.is_finite() {
        return 0;
    }
    (total_points / maximum_points * 100.0).round().clamp(0.0, 100.0) as u8
}

/// A candidate paired with its compatibility against the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(rename = "match")]
    pub candidate: Profile,
    pub compatibility: CompatibilityResult,
}

/// Display label derived from score and provider message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityLevel {
    #[serde(rename = "Not Recommended")]
    NotRecommended,
    #[serde(rename = "Good Compatibility")]
    Good,
    #[serde(rename = "Moderate Compatibility")]
    Moderate,
    #[serde(rename = "Low Compatibility")]
    Low,
}

impl CompatibilityLevel {
    pub fn label(self) -> &'static str {
        match self {
            CompatibilityLevel::NotRecommended => "Not Recommended",
            CompatibilityLevel::Good => "Good Compatibility",
            CompatibilityLevel::Moderate => "Moderate Compatibility",
            CompatibilityLevel::Low => "Low Compatibility",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NakshatraDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lord: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pada: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RashiDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lord: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KootDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub varna: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gana: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nadi: Option<String>,
}

/// Candidate's astrological display data taken from the provider payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstrologicalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nakshatra: Option<NakshatraDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rashi: Option<RashiDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub koot: Option<KootDetails>,
}

/// Per-candidate output of the results formatter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedMatch {
    pub id: String,
    pub name: String,
    pub age: i32,
    pub location: String,
    pub occupation: String,
    pub dob: String,
    pub tob: String,
    pub gender: Gender,
    pub compatibility_score: u8,
    pub compatibility_level: CompatibilityLevel,
    pub message_type: String,
    pub message_description: String,
    pub total_points: f64,
    pub maximum_points: f64,
    pub raw_response: Value,
    pub astrological_details: AstrologicalDetails,
}

/// Aggregate figures over the surfaced matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStatistics {
    pub total_matches: usize,
    pub average_score: f64,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub good_matches: usize,
    pub moderate_matches: usize,
    pub low_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub overall_assessment: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtering_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<MatchStatistics>,
    pub message: String,
}

/// Final matchmaking report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub user_profile: Option<Profile>,
    pub matches: Vec<FormattedMatch>,
    pub total_matches: usize,
    pub best_match: Option<FormattedMatch>,
    pub analysis: Analysis,
}

/// Score boundaries and surfacing cap used for tiering and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierThresholds {
    pub good: u8,
    pub moderate: u8,
    pub max_surfaced: usize,
}

pub const DEFAULT_GOOD_THRESHOLD: u8 = 70;
pub const DEFAULT_MODERATE_THRESHOLD: u8 = 50;
pub const DEFAULT_MAX_SURFACED: usize = 5;

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            good: DEFAULT_GOOD_THRESHOLD,
            moderate: DEFAULT_MODERATE_THRESHOLD,
            max_surfaced: DEFAULT_MAX_SURFACED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_from_points() {
        assert_eq!(compatibility_score(28.0, 36.0), 78);
        assert_eq!(compatibility_score(36.0, 36.0), 100);
        assert_eq!(compatibility_score(0.0, 36.0), 0);
        assert_eq!(compatibility_score(18.5, 36.0), 51);
    }

    #[test]
    fn test_error_record_normalized() {
        let record: CompatibilityResult = serde_json::from_value(serde_json::json!({
            "error": "Request failed: timeout",
            "compatibility_score": 64
        }))
        .unwrap();
        assert_eq!(record.message_type, "neutral");

        let record = record.normalized();
        assert_eq!(record.compatibility_score, 0);
        assert_eq!(record.message_type, "error");
        assert!(record.is_error());

        let ok: CompatibilityResult = serde_json::from_value(serde_json::json!({
            "compatibility_score": 64,
            "message_type": "auspicious"
        }))
        .unwrap();
        let ok = ok.normalized();
        assert_eq!(ok.compatibility_score, 64);
        assert_eq!(ok.message_type, "auspicious");
    }

    #[test]
    fn test_score_degenerate_scale() {
        assert_eq!(compatibility_score(10.0, 0.0), 0);
        assert_eq!(compatibility_score(50.0, 36.0), 100);
        assert_eq!(compatibility_score(f64::NAN, 36.0), 0);
    }

    #[test]
    fn test_coordinates_accept_strings() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "name": "Priya",
            "dob": "1995-02-02",
            "tob": "06:00",
            "place": "Chennai, India",
            "gender": "female",
            "lat": "13.0827",
            "lon": 80.2707
        }))
        .unwrap();

        assert_eq!(profile.lat, Some(13.0827));
        assert_eq!(profile.lon, Some(80.2707));
        assert_eq!(profile.occupation, "");
    }

    #[test]
    fn test_store_row_leniency() {
        let profile: Profile = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "Meera",
            "dob": "1996-11-20",
            "tob": null,
            "place": "Madurai",
            "gender": "female",
            "occupation": null,
            "lat": null,
            "created_at": "2025-06-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(profile.id.as_deref(), Some("42"));
        assert_eq!(profile.tob, "");
        assert_eq!(profile.lat, None);
        assert!(profile.coordinates().is_none());
    }

    #[test]
    fn test_profile_validation() {
        let mut profile: Profile = serde_json::from_value(serde_json::json!({
            "name": "Arjun",
            "dob": "1993-07-14",
            "tob": "21:45",
            "place": "Pune, India",
            "gender": "male"
        }))
        .unwrap();
        assert!(profile.validate().is_ok());

        profile.dob = "14/07/1993".to_string();
        assert!(profile.validate().is_err());

        profile.dob = "1993-07-14".to_string();
        profile.tob = "9pm".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_failed_compatibility() {
        let result = CompatibilityResult::failed("Failed to get access token");
        assert_eq!(result.compatibility_score, 0);
        assert_eq!(result.message_type, "error");
        assert_eq!(result.summary, "Error: Failed to get access token");
        assert!(result.is_error());
    }

    #[test]
    fn test_gender_round_trip() {
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(Gender::Male.opposite(), Gender::Female);
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"male\"");
    }

    #[test]
    fn test_level_labels_serialize() {
        let json = serde_json::to_string(&CompatibilityLevel::NotRecommended).unwrap();
        assert_eq!(json, "\"Not Recommended\"");
        assert_eq!(CompatibilityLevel::Moderate.label(), "Moderate Compatibility");
    }
}
