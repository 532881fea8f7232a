use crate::models::{Gender, Profile};
use crate::services::store::StoreError;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

/// PostgreSQL candidate store
///
/// Alternative to the Supabase REST backend for deployments that talk to
/// the database directly. The `profiles` table is created by the embedded
/// migrations on connect.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// All profiles with the given gender, oldest first
    pub async fn profiles_by_gender(&self, gender: Gender) -> Result<Vec<Profile>, StoreError> {
        let query = r#"
            SELECT id, name, dob, tob, place, gender, occupation, lat, lon
            FROM profiles
            WHERE gender = $1
            ORDER BY created_at ASC
        "#;

        let rows = sqlx::query(query)
            .bind(gender.as_str())
            .fetch_all(&self.pool)
            .await?;

        let profiles: Vec<Profile> = rows
            .iter()
            .filter_map(|row| match profile_from_row(row) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    tracing::warn!("Skipping unreadable profile row: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Loaded {} {} profiles", profiles.len(), gender);

        Ok(profiles)
    }

    /// Insert a profile, generating an id when it has none
    pub async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let query = r#"
            INSERT INTO profiles (id, name, dob, tob, place, gender, occupation, lat, lon)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, dob, tob, place, gender, occupation, lat, lon
        "#;

        let id = profile
            .id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let row = sqlx::query(query)
            .bind(&id)
            .bind(&profile.name)
            .bind(&profile.dob)
            .bind(&profile.tob)
            .bind(&profile.place)
            .bind(profile.gender.as_str())
            .bind(&profile.occupation)
            .bind(profile.lat)
            .bind(profile.lon)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Stored profile {} ({})", id, profile.name);

        profile_from_row(&row)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn profile_from_row(row: &PgRow) -> Result<Profile, StoreError> {
    let gender: String = row.try_get("gender")?;

    Ok(Profile {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        dob: row.try_get("dob")?,
        tob: row.try_get("tob")?,
        place: row.try_get("place")?,
        gender: gender.parse().map_err(StoreError::InvalidResponse)?,
        occupation: row.try_get("occupation")?,
        lat: row.try_get("lat")?,
        lon: row.try_get("lon")?,
    })
}
