use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{domain, TierThresholds};

/// Upper bound on concurrent compatibility lookups
pub const MAX_CONCURRENT_LOOKUPS: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub geocoding: GeocodingSettings,
    pub prokerala: ProkeralaSettings,
    pub store: StoreSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub formatting: FormattingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    pub endpoint: String,
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_geocode_cache_size")]
    pub cache_size: u64,
    #[serde(default = "default_geocode_cache_ttl")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProkeralaSettings {
    pub endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_ayanamsa")]
    pub ayanamsa: u8,
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Supabase,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub supabase_url: String,
    #[serde(default)]
    pub supabase_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormattingSettings {
    #[serde(default = "default_good_threshold")]
    pub good_threshold: u8,
    #[serde(default = "default_moderate_threshold")]
    pub moderate_threshold: u8,
    #[serde(default = "default_max_surfaced")]
    pub max_surfaced: usize,
}

impl Default for FormattingSettings {
    fn default() -> Self {
        Self {
            good_threshold: default_good_threshold(),
            moderate_threshold: default_moderate_threshold(),
            max_surfaced: default_max_surfaced(),
        }
    }
}

impl FormattingSettings {
    pub fn thresholds(&self) -> TierThresholds {
        TierThresholds {
            good: self.good_threshold,
            moderate: self.moderate_threshold,
            max_surfaced: self.max_surfaced,
        }
    }
}

fn default_timeout_secs() -> u64 { 30 }
fn default_geocode_cache_size() -> u64 { 1000 }
fn default_geocode_cache_ttl() -> u64 { 86_400 }
fn default_ayanamsa() -> u8 { 1 }
fn default_timezone_offset() -> String { "+05:30".to_string() }
fn default_language() -> String { "en".to_string() }
fn default_store_backend() -> StoreBackend { StoreBackend::Supabase }
fn default_table() -> String { "profiles".to_string() }
fn default_max_concurrent_lookups() -> usize { 4 }
fn default_good_threshold() -> u8 { domain::DEFAULT_GOOD_THRESHOLD }
fn default_moderate_threshold() -> u8 { domain::DEFAULT_MODERATE_THRESHOLD }
fn default_max_surfaced() -> usize { domain::DEFAULT_MAX_SURFACED }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MATCHSTAR__)
    /// 5. Provider credentials from their usual env vars
    pub fn load() -> Result<Self, ConfigError> {
        let files = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        Self::from_files(files, |name| std::env::var(name).ok())
    }

    /// Load configuration from a custom path, with the same env overrides as [`Settings::load`]
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_from_with(path.as_ref(), |name| std::env::var(name).ok())
    }

    fn load_from_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_files(Config::builder().add_source(File::from(path)), lookup)
    }

    fn from_files<F>(files: ConfigBuilder<DefaultState>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = files
            // e.g., MATCHSTAR__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MATCHSTAR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = apply_credential_overrides(settings, lookup)?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject values the matching pipeline cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lookups = self.matching.max_concurrent_lookups;
        if !(1..=MAX_CONCURRENT_LOOKUPS).contains(&lookups) {
            return Err(ConfigError::Message(format!(
                "matching.max_concurrent_lookups must be within 1..={}, got {}",
                MAX_CONCURRENT_LOOKUPS, lookups
            )));
        }

        let formatting = &self.formatting;
        if formatting.good_threshold > 100 {
            return Err(ConfigError::Message(format!(
                "formatting.good_threshold must be at most 100, got {}",
                formatting.good_threshold
            )));
        }
        if formatting.moderate_threshold > formatting.good_threshold {
            return Err(ConfigError::Message(format!(
                "formatting.moderate_threshold ({}) must not exceed formatting.good_threshold ({})",
                formatting.moderate_threshold, formatting.good_threshold
            )));
        }
        if formatting.max_surfaced == 0 {
            return Err(ConfigError::Message(
                "formatting.max_surfaced must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Plain env vars the providers document, mapped onto their config keys
const CREDENTIAL_VARS: &[(&str, &str)] = &[
    ("PROKERALA_CLIENT_ID", "prokerala.client_id"),
    ("PROKERALA_CLIENT_SECRET", "prokerala.client_secret"),
    ("SUPABASE_URL", "store.supabase_url"),
    ("SUPABASE_KEY", "store.supabase_key"),
    ("DATABASE_URL", "store.database_url"),
];

fn apply_credential_overrides<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in CREDENTIAL_VARS {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [server]
        host = "127.0.0.1"
        port = 8080

        [geocoding]
        endpoint = "https://nominatim.openstreetmap.org"
        user_agent = "match-my-star/0.1"

        [prokerala]
        endpoint = "https://api.prokerala.com"

        [store]
        supabase_url = "https://example.supabase.co"
    "#;

    fn minimal_config() -> Config {
        Config::builder()
            .add_source(File::from_str(MINIMAL, FileFormat::Toml))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let settings: Settings = minimal_config().try_deserialize().unwrap();

        assert_eq!(settings.store.backend, StoreBackend::Supabase);
        assert_eq!(settings.store.table, "profiles");
        assert_eq!(settings.prokerala.ayanamsa, 1);
        assert_eq!(settings.prokerala.timezone_offset, "+05:30");
        assert_eq!(settings.matching.max_concurrent_lookups, 4);
        assert_eq!(settings.formatting.thresholds(), TierThresholds::default());
    }

    #[test]
    fn test_credential_overrides() {
        let settings = apply_credential_overrides(minimal_config(), |name| match name {
            "PROKERALA_CLIENT_ID" => Some("client-123".to_string()),
            "SUPABASE_KEY" => Some("service-key".to_string()),
            "DATABASE_URL" => Some(String::new()),
            _ => None,
        })
        .unwrap();

        let settings: Settings = settings.try_deserialize().unwrap();
        assert_eq!(settings.prokerala.client_id, "client-123");
        assert_eq!(settings.store.supabase_key, "service-key");
        assert!(settings.store.database_url.is_none());
    }

    fn settings_with(extra: &str) -> Result<Settings, ConfigError> {
        let source = format!("{}\n{}", MINIMAL, extra);
        let config = Config::builder()
            .add_source(File::from_str(&source, FileFormat::Toml))
            .build()?;
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    #[test]
    fn test_load_from_applies_credentials() {
        let path = std::env::temp_dir().join(format!("match-my-star-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, MINIMAL).unwrap();

        let settings = Settings::load_from_with(&path, |name| match name {
            "PROKERALA_CLIENT_ID" => Some("client-123".to_string()),
            "SUPABASE_URL" => Some("https://override.supabase.co".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/matchstar".to_string()),
            _ => None,
        });
        std::fs::remove_file(&path).ok();

        let settings = settings.unwrap();
        assert_eq!(settings.prokerala.client_id, "client-123");
        assert_eq!(settings.store.supabase_url, "https://override.supabase.co");
        assert_eq!(settings.store.database_url.as_deref(), Some("postgres://localhost/matchstar"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(settings_with("").is_ok());
        assert!(settings_with("[matching]\nmax_concurrent_lookups = 0").is_err());
        assert!(settings_with("[matching]\nmax_concurrent_lookups = 33").is_err());
        assert!(settings_with("[matching]\nmax_concurrent_lookups = 32").is_ok());
        assert!(settings_with("[formatting]\ngood_threshold = 60\nmoderate_threshold = 65").is_err());
        assert!(settings_with("[formatting]\ngood_threshold = 101").is_err());
        assert!(settings_with("[formatting]\nmax_surfaced = 0").is_err());
        assert!(settings_with("[formatting]\ngood_threshold = 80\nmoderate_threshold = 60").is_ok());
    }

    #[test]
    fn test_default_thresholds() {
        let formatting = FormattingSettings::default();
        assert_eq!(formatting.good_threshold, 70);
        assert_eq!(formatting.moderate_threshold, 50);
        assert_eq!(formatting.max_surfaced, 5);
    }
}
