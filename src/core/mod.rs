// Core algorithm exports
pub mod analysis;
pub mod astro;
pub mod filters;
pub mod formatter;
pub mod tiers;

pub use analysis::{analyze_compatibility_results, analysis_message};
pub use astro::{extract_astrological_details, message_description, person_info_key};
pub use filters::filter_best_matches;
pub use formatter::{age_in_year, ResultsFormatter};
pub use tiers::{compatibility_level, Tier};
