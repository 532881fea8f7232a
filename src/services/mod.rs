// Service exports
pub mod geocode;
pub mod pipeline;
pub mod postgres;
pub mod prokerala;
pub mod store;
pub mod supabase;

pub use geocode::{GeocodeClient, GeocodeError};
pub use pipeline::{MatchmakingPipeline, PipelineError};
pub use postgres::PostgresClient;
pub use prokerala::{ProkeralaClient, ProkeralaError, ProkeralaOptions};
pub use store::{CandidateStore, StoreError};
pub use supabase::SupabaseClient;
