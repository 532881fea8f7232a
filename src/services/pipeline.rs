use crate::core::ResultsFormatter;
use crate::models::{CompatibilityResult, MatchRecord, Profile, ReportSummary};
use crate::services::{
    geocode::{GeocodeClient, GeocodeError},
    prokerala::ProkeralaClient,
    store::{CandidateStore, StoreError},
};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;

/// Errors that stop a pipeline run before a report can be built
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Profile store error: {0}")]
    Store(#[from] StoreError),
}

/// Matchmaking workflow: geocode, fetch candidates, score, format
///
/// Each stage is also exposed on its own so the per-agent endpoints can
/// drive a single step.
pub struct MatchmakingPipeline {
    geocoder: Arc<GeocodeClient>,
    store: Arc<CandidateStore>,
    prokerala: Arc<ProkeralaClient>,
    formatter: ResultsFormatter,
    default_concurrency: usize,
}

impl MatchmakingPipeline {
    pub fn new(
        geocoder: Arc<GeocodeClient>,
        store: Arc<CandidateStore>,
        prokerala: Arc<ProkeralaClient>,
        formatter: ResultsFormatter,
        default_concurrency: usize,
    ) -> Self {
        Self {
            geocoder,
            store,
            prokerala,
            formatter,
            default_concurrency: default_concurrency.max(1),
        }
    }

    pub fn store(&self) -> &CandidateStore {
        &self.store
    }

    /// Profile enriched with the coordinates of its birthplace
    pub async fn geocode_profile(&self, profile: &Profile) -> Result<Profile, GeocodeError> {
        let coordinates = self.geocoder.resolve(&profile.place).await?;
        Ok(profile.with_coordinates(coordinates))
    }

    /// Candidates of the opposite gender to `user`
    pub async fn fetch_candidates(&self, user: &Profile) -> Vec<Profile> {
        let wanted = user.gender.opposite();
        let candidates = self.store.find_candidates(wanted).await;

        tracing::info!("Found {} {} candidates for {}", candidates.len(), wanted, user.name);

        candidates
    }

    /// Kundli compatibility of `user` against every candidate
    ///
    /// Lookups run concurrently, at most `max_concurrency` at a time; the
    /// output keeps candidate order. Failed lookups become error records.
    pub async fn score_candidates(
        &self,
        user: &Profile,
        candidates: Vec<Profile>,
        max_concurrency: Option<usize>,
    ) -> Vec<MatchRecord> {
        let limit = max_concurrency.unwrap_or(self.default_concurrency).max(1);
        let user_details = user.birth_details();

        tracing::debug!("Scoring {} candidates (concurrency {})", candidates.len(), limit);

        stream::iter(candidates)
            .map(|candidate| {
                let user_details = &user_details;
                async move {
                    let compatibility = match self
                        .prokerala
                        .kundli_match(user_details, &candidate.birth_details())
                        .await
                    {
                        Ok(compatibility) => compatibility,
                        Err(e) => {
                            tracing::warn!("Compatibility lookup failed for {}: {}", candidate.name, e);
                            CompatibilityResult::failed(e.to_string())
                        }
                    };

                    MatchRecord { candidate, compatibility }
                }
            })
            .buffered(limit)
            .collect()
            .await
    }

    pub fn format_results(&self, records: Vec<MatchRecord>, user: Option<Profile>) -> ReportSummary {
        self.formatter.format_results(records, user)
    }

    /// Run the whole workflow for one user
    ///
    /// The birthplace is geocoded unless the profile already carries
    /// coordinates. Only a failed geocode aborts the run.
    pub async fn find_matches(
        &self,
        user: Profile,
        max_concurrency: Option<usize>,
    ) -> Result<ReportSummary, PipelineError> {
        let user = match user.coordinates() {
            Some(_) => user,
            None => self.geocode_profile(&user).await?,
        };

        let candidates = self.fetch_candidates(&user).await;
        let records = self.score_candidates(&user, candidates, max_concurrency).await;
        let report = self.format_results(records, Some(user));

        tracing::info!(
            "Report ready: {} surfaced, assessment: {}",
            report.total_matches,
            report.analysis.overall_assessment
        );

        Ok(report)
    }

    /// Store a new candidate, geocoding it first when it has no coordinates
    pub async fn register_profile(&self, profile: Profile) -> Result<Profile, PipelineError> {
        let profile = match profile.coordinates() {
            Some(_) => profile,
            None => self.geocode_profile(&profile).await?,
        };

        Ok(self.store.insert_profile(&profile).await?)
    }
}
