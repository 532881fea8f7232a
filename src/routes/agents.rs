use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{AgentError, ErrorResponse, FormatResultsRequest, KundliMatchRequest, ProfileRequest};
use crate::routes::AppState;

/// Configure the per-agent routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/agents/astro-data", web::post().to(astro_data))
        .route("/agents/geocode", web::post().to(geocode))
        .route("/agents/filter-profiles", web::post().to(filter_profiles))
        .route("/agents/kundli-match", web::post().to(kundli_match))
        .route("/agents/format-results", web::post().to(format_results));
}

pub(crate) fn validation_failed(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

/// Intake agent: returns the validated profile unchanged
///
/// POST /api/v1/agents/astro-data
async fn astro_data(req: web::Json<ProfileRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for astro-data request: {:?}", errors);
        return validation_failed(errors);
    }

    HttpResponse::Ok().json(&req.user_profile)
}

/// Coordinate resolver agent
///
/// POST /api/v1/agents/geocode
///
/// Responds with the profile plus `lat`/`lon`, or `{"error": "..."}`.
async fn geocode(state: web::Data<AppState>, req: web::Json<ProfileRequest>) -> impl Responder {
    match state.pipeline.geocode_profile(&req.user_profile).await {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(e) => {
            tracing::warn!("Geocoding failed for '{}': {}", req.user_profile.place, e);
            HttpResponse::Ok().json(AgentError {
                error: e.to_string(),
            })
        }
    }
}

/// Candidate store agent: profiles of the opposite gender
///
/// POST /api/v1/agents/filter-profiles
async fn filter_profiles(state: web::Data<AppState>, req: web::Json<ProfileRequest>) -> impl Responder {
    let candidates = state.pipeline.fetch_candidates(&req.user_profile).await;
    HttpResponse::Ok().json(candidates)
}

/// Compatibility agent: one record per candidate, in candidate order
///
/// POST /api/v1/agents/kundli-match
///
/// Request body:
/// ```json
/// {
///   "user_profile": { "name": "...", "dob": "1993-07-14", "tob": "21:45", "gender": "male", "lat": 18.52, "lon": 73.85, ... },
///   "candidates": [ { ... } ],
///   "max_concurrency": 4
/// }
/// ```
async fn kundli_match(state: web::Data<AppState>, req: web::Json<KundliMatchRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for kundli-match request: {:?}", errors);
        return validation_failed(errors);
    }

    let req = req.into_inner();
    tracing::info!("Scoring {} candidates for {}", req.candidates.len(), req.user_profile.name);

    let records = state
        .pipeline
        .score_candidates(&req.user_profile, req.candidates, req.max_concurrency)
        .await;

    HttpResponse::Ok().json(records)
}

/// Results formatter agent
///
/// POST /api/v1/agents/format-results
async fn format_results(state: web::Data<AppState>, req: web::Json<FormatResultsRequest>) -> impl Responder {
    let req = req.into_inner();
    let records = req
        .compatibility_results
        .into_iter()
        .map(|mut record| {
            record.compatibility = record.compatibility.normalized();
            record
        })
        .collect();

    let report = state.pipeline.format_results(records, req.user_profile);

    HttpResponse::Ok().json(report)
}
