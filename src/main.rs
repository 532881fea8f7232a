use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use match_my_star::config::{Settings, StoreBackend};
use match_my_star::core::ResultsFormatter;
use match_my_star::routes::{self, AppState};
use match_my_star::services::{
    CandidateStore, GeocodeClient, MatchmakingPipeline, PostgresClient, ProkeralaClient, ProkeralaOptions,
    SupabaseClient,
};
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Initialize logging; RUST_LOG wins over LOG_LEVEL
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }

    info!("Starting MatchMyStar matchmaking service...");

    // Load configuration; MATCHSTAR_CONFIG points at an explicit file
    let settings = match std::env::var("MATCHSTAR_CONFIG") {
        Ok(path) => Settings::load_from(&path),
        Err(_) => Settings::load(),
    }
    .map_err(|e| startup_error("Configuration error", e))?;

    info!("Configuration loaded successfully");

    let geocoder = GeocodeClient::new(
        settings.geocoding.endpoint.clone(),
        settings.geocoding.user_agent.clone(),
        settings.geocoding.timeout_secs,
        settings.geocoding.cache_size,
        settings.geocoding.cache_ttl_secs,
    )
    .map_err(|e| startup_error("Failed to create geocoding client", e))?;

    info!(
        "Geocoder initialized (cache: {} entries, TTL: {}s)",
        settings.geocoding.cache_size, settings.geocoding.cache_ttl_secs
    );

    if settings.prokerala.client_id.is_empty() || settings.prokerala.client_secret.is_empty() {
        error!("Prokerala credentials not set; every compatibility lookup will fail");
    }

    let prokerala = ProkeralaClient::new(
        settings.prokerala.endpoint.clone(),
        settings.prokerala.client_id.clone(),
        settings.prokerala.client_secret.clone(),
        ProkeralaOptions {
            ayanamsa: settings.prokerala.ayanamsa,
            timezone_offset: settings.prokerala.timezone_offset.clone(),
            language: settings.prokerala.language.clone(),
        },
        settings.prokerala.timeout_secs,
    )
    .map_err(|e| startup_error("Failed to create Prokerala client", e))?;

    let store = match settings.store.backend {
        StoreBackend::Supabase => {
            if settings.store.supabase_url.is_empty() || settings.store.supabase_key.is_empty() {
                return Err(startup_error("Configuration error", "SUPABASE_URL or SUPABASE_KEY not set"));
            }
            CandidateStore::Supabase(
                SupabaseClient::new(
                    settings.store.supabase_url.clone(),
                    settings.store.supabase_key.clone(),
                    settings.store.table.clone(),
                    settings.store.timeout_secs,
                )
                .map_err(|e| startup_error("Failed to create Supabase client", e))?,
            )
        }
        StoreBackend::Postgres => {
            let url = settings
                .store
                .database_url
                .clone()
                .ok_or_else(|| startup_error("Configuration error", "DATABASE_URL not set"))?;
            CandidateStore::Postgres(
                PostgresClient::new(
                    &url,
                    settings.store.max_connections.unwrap_or(10),
                    settings.store.min_connections.unwrap_or(1),
                    settings.store.acquire_timeout_secs.unwrap_or(5),
                )
                .await
                .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
            )
        }
    };

    info!("Candidate store initialized ({})", store.backend_name());

    let thresholds = settings.formatting.thresholds();
    let formatter = ResultsFormatter::new(thresholds);

    info!("Formatter initialized with thresholds: {:?}", thresholds);

    let pipeline = MatchmakingPipeline::new(
        Arc::new(geocoder),
        Arc::new(store),
        Arc::new(prokerala),
        formatter,
        settings.matching.max_concurrent_lookups,
    );

    // Build application state
    let app_state = AppState {
        pipeline: Arc::new(pipeline),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
