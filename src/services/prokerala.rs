use crate::models::{
    compatibility_score, domain::DEFAULT_MAXIMUM_POINTS, BirthDetails, CompatibilityResult, Gender,
};
use chrono::{NaiveDate, NaiveTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

/// Tokens are refreshed this long before the provider says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Errors that can occur when calling the Prokerala API
#[derive(Debug, Error)]
pub enum ProkeralaError {
    #[error("Request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to get access token: {0}")]
    TokenError(String),

    #[error("Unauthorized: invalid client credentials or token")]
    Unauthorized,

    #[error("API Error: {0}")]
    ApiError(String),

    #[error("Missing birth coordinates for the {0} party")]
    MissingCoordinates(&'static str),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Request-shaping options for kundli matching
#[derive(Debug, Clone)]
pub struct ProkeralaOptions {
    /// Ayanamsa id; 1 is Lahiri
    pub ayanamsa: u8,
    /// UTC offset appended to birth timestamps, e.g. `+05:30`
    pub timezone_offset: String,
    pub language: String,
}

impl Default for ProkeralaOptions {
    fn default() -> Self {
        Self {
            ayanamsa: 1,
            timezone_offset: "+05:30".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 { 3600 }

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    refresh_at: Instant,
}

/// Prokerala kundli-matching client
///
/// Handles the OAuth2 client-credentials exchange and normalizes the
/// matching response into a [`CompatibilityResult`]. The provider's
/// `boy`/`girl` parameter naming stays inside this client.
pub struct ProkeralaClient {
    base_url: String,
    client_id: String,
    client_secret: String,
    options: ProkeralaOptions,
    client: Client,
    token: Mutex<Option<AccessToken>>,
}

impl ProkeralaClient {
    pub fn new(
        base_url: String,
        client_id: String,
        client_secret: String,
        options: ProkeralaOptions,
        timeout_secs: u64,
    ) -> Result<Self, ProkeralaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            client_id,
            client_secret,
            options,
            client,
            token: Mutex::new(None),
        })
    }

    /// Compare two people and normalize the provider's verdict
    pub async fn kundli_match(
        &self,
        user: &BirthDetails,
        candidate: &BirthDetails,
    ) -> Result<CompatibilityResult, ProkeralaError> {
        let (boy, girl) = assign_roles(user, candidate);

        let boy_coordinates = coordinates_param(boy, "boy")?;
        let girl_coordinates = coordinates_param(girl, "girl")?;
        let boy_dob = format_birth_timestamp(&boy.dob, &boy.tob, &self.options.timezone_offset);
        let girl_dob = format_birth_timestamp(&girl.dob, &girl.tob, &self.options.timezone_offset);

        let token = self.access_token().await?;

        let url = format!(
            "{}/v2/astrology/kundli-matching",
            self.base_url.trim_end_matches('/')
        );

        let ayanamsa = self.options.ayanamsa.to_string();
        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&[
                ("ayanamsa", ayanamsa.as_str()),
                ("boy_dob", boy_dob.as_str()),
                ("boy_coordinates", boy_coordinates.as_str()),
                ("girl_dob", girl_dob.as_str()),
                ("girl_coordinates", girl_coordinates.as_str()),
                ("la", self.options.language.as_str()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Force a fresh token on the next call
            self.token.lock().await.take();
            return Err(ProkeralaError::Unauthorized);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProkeralaError::InvalidResponse(e.to_string()))?;

        normalize_response(body)
    }

    /// Cached bearer token, fetching a new one when missing or near expiry
    async fn access_token(&self) -> Result<String, ProkeralaError> {
        // Held across the fetch so concurrent lookups share one token request
        let mut guard = self.token.lock().await;

        if let Some(token) = guard.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}/token", self.base_url.trim_end_matches('/'));

        tracing::debug!("Requesting Prokerala access token");

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Token request rejected: {} - {}", status, body);
            return Err(ProkeralaError::TokenError(status.to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProkeralaError::TokenError(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(AccessToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

/// The male party takes the `boy_*` parameters, the female party `girl_*`
///
/// Same-gender pairs keep the user in the `boy` slot.
fn assign_roles<'a>(
    user: &'a BirthDetails,
    candidate: &'a BirthDetails,
) -> (&'a BirthDetails, &'a BirthDetails) {
    if user.gender == Gender::Female && candidate.gender == Gender::Male {
        (candidate, user)
    } else {
        (user, candidate)
    }
}

fn coordinates_param(details: &BirthDetails, role: &'static str) -> Result<String, ProkeralaError> {
    match (details.lat, details.lon) {
        (Some(lat), Some(lon)) => Ok(format!("{},{}", lat, lon)),
        _ => Err(ProkeralaError::MissingCoordinates(role)),
    }
}

/// ISO 8601 birth timestamp in the form the provider expects
///
/// Falls back to plain concatenation when the inputs do not parse.
pub fn format_birth_timestamp(dob: &str, tob: &str, offset: &str) -> String {
    let date = NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d");
    let time = NaiveTime::parse_from_str(tob.trim(), "%H:%M");

    match (date, time) {
        (Ok(date), Ok(time)) => format!("{}{}", date.and_time(time).format("%Y-%m-%dT%H:%M:%S"), offset),
        _ => {
            tracing::warn!("Could not parse birth date/time '{} {}', sending as-is", dob, tob);
            format!("{}T{}:00{}", dob, tob, offset)
        }
    }
}

/// Map a kundli-matching response body onto a compatibility record
fn normalize_response(body: Value) -> Result<CompatibilityResult, ProkeralaError> {
    if body.get("status").and_then(Value::as_str) != Some("ok") {
        return Err(ProkeralaError::ApiError(provider_error_text(&body)));
    }

    let data = body
        .get("data")
        .cloned()
        .ok_or_else(|| ProkeralaError::InvalidResponse("Missing data object".into()))?;

    let total_points = data
        .pointer("/guna_milan/total_points")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    let maximum_points = data
        .pointer("/guna_milan/maximum_points")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_MAXIMUM_POINTS);

    let message_type = data
        .pointer("/message/type")
        .and_then(Value::as_str)
        .unwrap_or("neutral")
        .to_string();
    let summary = data
        .pointer("/message/description")
        .and_then(Value::as_str)
        .unwrap_or("Compatibility analysis completed")
        .to_string();

    Ok(CompatibilityResult {
        compatibility_score: compatibility_score(total_points, maximum_points),
        total_points,
        maximum_points,
        message_type,
        summary,
        raw_response: data,
        error: None,
    })
}

fn provider_error_text(body: &Value) -> String {
    body.pointer("/errors/0/detail")
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details(gender: Gender, dob: &str) -> BirthDetails {
        BirthDetails {
            dob: dob.to_string(),
            tob: "06:00".to_string(),
            lat: Some(13.0827),
            lon: Some(80.2707),
            gender,
        }
    }

    #[test]
    fn test_birth_timestamp() {
        assert_eq!(
            format_birth_timestamp("2000-01-01", "06:00", "+05:30"),
            "2000-01-01T06:00:00+05:30"
        );
        assert_eq!(
            format_birth_timestamp("2000/01/01", "6am", "+05:30"),
            "2000/01/01T6am:00+05:30"
        );
    }

    #[test]
    fn test_role_assignment() {
        let male = details(Gender::Male, "1993-07-14");
        let female = details(Gender::Female, "1995-02-02");

        let (boy, girl) = assign_roles(&female, &male);
        assert_eq!(boy.dob, "1993-07-14");
        assert_eq!(girl.dob, "1995-02-02");

        let (boy, girl) = assign_roles(&male, &female);
        assert_eq!(boy.dob, "1993-07-14");
        assert_eq!(girl.dob, "1995-02-02");
    }

    #[test]
    fn test_normalize_ok_response() {
        let result = normalize_response(json!({
            "status": "ok",
            "data": {
                "guna_milan": { "total_points": 28, "maximum_points": 36 },
                "message": { "type": "auspicious", "description": "Good match." }
            }
        }))
        .unwrap();

        assert_eq!(result.compatibility_score, 78);
        assert_eq!(result.total_points, 28.0);
        assert_eq!(result.message_type, "auspicious");
        assert_eq!(result.summary, "Good match.");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_normalize_error_response() {
        let err = normalize_response(json!({
            "status": "error",
            "errors": [{ "title": "Validation Error", "detail": "Invalid coordinates" }]
        }))
        .unwrap_err();

        assert_eq!(err.to_string(), "API Error: Invalid coordinates");
    }

    #[tokio::test]
    async fn test_missing_coordinates_short_circuits() {
        let client = ProkeralaClient::new(
            "http://127.0.0.1:9".to_string(),
            "id".to_string(),
            "secret".to_string(),
            ProkeralaOptions::default(),
            5,
        )
        .unwrap();

        let mut candidate = details(Gender::Female, "1995-02-02");
        candidate.lon = None;

        let err = client
            .kundli_match(&details(Gender::Male, "1993-07-14"), &candidate)
            .await
            .unwrap_err();
        assert!(matches!(err, ProkeralaError::MissingCoordinates("girl")));
    }

    #[tokio::test]
    async fn test_token_reused_across_calls() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()))
            .with_status(200)
            .with_body(r#"{"access_token": "abc123", "token_type": "Bearer", "expires_in": 3600}"#)
            .expect(1)
            .create_async()
            .await;
        let match_mock = server
            .mock("GET", "/v2/astrology/kundli-matching")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "Bearer abc123")
            .with_status(200)
            .with_body(
                r#"{"status": "ok", "data": {"guna_milan": {"total_points": 18, "maximum_points": 36},
                    "message": {"type": "neutral", "description": "Average match."}}}"#,
            )
            .expect(2)
            .create_async()
            .await;

        let client = ProkeralaClient::new(
            server.url(),
            "id".to_string(),
            "secret".to_string(),
            ProkeralaOptions::default(),
            5,
        )
        .unwrap();

        let user = details(Gender::Male, "1993-07-14");
        let candidate = details(Gender::Female, "1995-02-02");
        let first = client.kundli_match(&user, &candidate).await.unwrap();
        let second = client.kundli_match(&user, &candidate).await.unwrap();

        assert_eq!(first.compatibility_score, 50);
        assert_eq!(first, second);
        token_mock.assert_async().await;
        match_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _token_mock = server
            .mock("POST", "/token")
            .with_status(401)
            .with_body(r#"{"error": "invalid_client"}"#)
            .create_async()
            .await;

        let client = ProkeralaClient::new(
            server.url(),
            "bad".to_string(),
            "creds".to_string(),
            ProkeralaOptions::default(),
            5,
        )
        .unwrap();

        let err = client
            .kundli_match(&details(Gender::Male, "1993-07-14"), &details(Gender::Female, "1995-02-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProkeralaError::TokenError(_)));
    }
}
