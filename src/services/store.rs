use crate::models::{Gender, Profile};
use crate::services::{postgres::PostgresClient, supabase::SupabaseClient};
use thiserror::Error;

/// Errors that can occur when reading or writing candidate profiles
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Candidate profile store, backed by Supabase REST or PostgreSQL
pub enum CandidateStore {
    Supabase(SupabaseClient),
    Postgres(PostgresClient),
}

impl CandidateStore {
    /// Stored candidates with the given gender
    ///
    /// Store failures are logged and reported as an empty list so the
    /// pipeline can still produce a (no matches) report.
    pub async fn find_candidates(&self, gender: Gender) -> Vec<Profile> {
        let result = match self {
            CandidateStore::Supabase(client) => client.profiles_by_gender(gender).await,
            CandidateStore::Postgres(client) => client.profiles_by_gender(gender).await,
        };

        match result {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::error!("Failed to fetch {} candidates: {}", gender, e);
                vec![]
            }
        }
    }

    /// Persist a profile and return what the store recorded
    pub async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        match self {
            CandidateStore::Supabase(client) => client.insert_profile(profile).await,
            CandidateStore::Postgres(client) => client.insert_profile(profile).await,
        }
    }

    pub async fn health_check(&self) -> Result<bool, StoreError> {
        match self {
            CandidateStore::Supabase(client) => client.health_check().await,
            CandidateStore::Postgres(client) => client.health_check().await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            CandidateStore::Supabase(_) => "supabase",
            CandidateStore::Postgres(_) => "postgres",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_failure_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/profiles")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let store = CandidateStore::Supabase(
            SupabaseClient::new(server.url(), "anon".to_string(), "profiles".to_string(), 5).unwrap(),
        );

        assert!(store.find_candidates(Gender::Female).await.is_empty());
        assert_eq!(store.backend_name(), "supabase");
    }
}
