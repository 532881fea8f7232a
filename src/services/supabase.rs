use crate::models::{Gender, Profile};
use crate::services::store::StoreError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Supabase (PostgREST) client for the candidate profile table
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    table: String,
    client: Client,
}

impl SupabaseClient {
    pub fn new(
        base_url: String,
        api_key: String,
        table: String,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            table,
            client,
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.table)
        )
    }

    /// All stored profiles with the given gender, in store order
    pub async fn profiles_by_gender(&self, gender: Gender) -> Result<Vec<Profile>, StoreError> {
        let url = format!(
            "{}?select=*&gender=eq.{}",
            self.table_url(),
            urlencoding::encode(gender.as_str())
        );

        tracing::debug!("Querying profiles with gender: {}", gender);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::ApiError(format!(
                "Failed to query profiles: {}",
                response.status()
            )));
        }

        let rows: Vec<Value> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let total = rows.len();
        let profiles: Vec<Profile> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Profile>(row) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping unreadable profile row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Queried {} profiles (rows: {})", profiles.len(), total);

        Ok(profiles)
    }

    /// Insert a profile and return the stored representation
    pub async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Prefer", "return=representation")
            .bearer_auth(&self.api_key)
            .json(profile)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to insert profile: {} - {}", status, body);
            return Err(StoreError::ApiError(format!("Failed to insert profile: {}", status)));
        }

        let mut rows: Vec<Profile> = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        if rows.is_empty() {
            return Err(StoreError::InvalidResponse("Insert returned no rows".into()));
        }

        Ok(rows.swap_remove(0))
    }

    /// Cheap reachability probe against the profile table
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}?select=id&limit=1", self.table_url());

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
