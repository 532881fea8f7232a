// Route exports
pub mod agents;
pub mod matchmaking;

use actix_web::web;
use crate::services::MatchmakingPipeline;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchmakingPipeline>,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(matchmaking::configure)
            .configure(agents::configure),
    );
}
