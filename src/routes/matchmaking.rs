use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{ErrorResponse, FindMatchesRequest, HealthResponse, RegisterProfileRequest};
use crate::routes::{agents::validation_failed, AppState};
use crate::services::PipelineError;

/// Configure the workflow and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matchmaking/find", web::post().to(find_matches))
        .route("/profiles", web::post().to(register_profile));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.pipeline.store().health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Find matches endpoint
///
/// POST /api/v1/matchmaking/find
///
/// Request body:
/// ```json
/// {
///   "user_profile": {
///     "name": "string",
///     "dob": "YYYY-MM-DD",
///     "tob": "HH:MM",
///     "place": "string",
///     "gender": "male|female",
///     "occupation": "string"
///   },
///   "max_concurrency": 4
/// }
/// ```
async fn find_matches(state: web::Data<AppState>, req: web::Json<FindMatchesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find request: {:?}", errors);
        return validation_failed(errors);
    }

    let req = req.into_inner();
    tracing::info!("Finding matches for {} ({})", req.user_profile.name, req.user_profile.gender);

    match state.pipeline.find_matches(req.user_profile, req.max_concurrency).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e @ PipelineError::Geocode(_)) => {
            tracing::warn!("Matchmaking aborted: {}", e);
            HttpResponse::UnprocessableEntity().json(ErrorResponse {
                error: "Birthplace could not be resolved".to_string(),
                message: e.to_string(),
                status_code: 422,
            })
        }
        Err(e) => {
            tracing::error!("Matchmaking failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Matchmaking failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Register a candidate profile
///
/// POST /api/v1/profiles
async fn register_profile(state: web::Data<AppState>, req: web::Json<RegisterProfileRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors);
    }

    match state.pipeline.register_profile(req.into_inner().profile).await {
        Ok(profile) => HttpResponse::Created().json(profile),
        Err(e @ PipelineError::Geocode(_)) => HttpResponse::UnprocessableEntity().json(ErrorResponse {
            error: "Birthplace could not be resolved".to_string(),
            message: e.to_string(),
            status_code: 422,
        }),
        Err(e) => {
            tracing::error!("Failed to store profile: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Failed to store profile".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}
