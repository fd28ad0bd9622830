use crate::error::ConfigError;
use crate::geo::nominatim::DEFAULT_NOMINATIM_URL;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Runtime configuration, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    /// Document store base URL; `None` runs on the in-memory store
    pub store_url: Option<String>,
    pub store_token: Option<String>,
    /// Listings to preload into the in-memory store
    pub seed_file: Option<PathBuf>,
    pub auth_url: Option<String>,
    pub api_key: Option<String>,
    pub storage_url: Option<String>,
    pub geocoder_url: String,
    /// Country code for local WhatsApp numbers
    pub whatsapp_prefix: String,
    pub public_url: String,
    pub http_timeout: Duration,
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_default(key: &'static str, default: &str) -> String {
    var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError { key, value: raw }),
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Loaded .env");
        }
        Self::from_env()
    }

    /// Like [`Config::load`] but without touching `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parsed("INMO_HTTP_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(ConfigError {
                key: "INMO_HTTP_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            store_url: var("INMO_STORE_URL"),
            store_token: var("INMO_STORE_TOKEN"),
            seed_file: var("INMO_SEED_FILE").map(PathBuf::from),
            auth_url: var("INMO_AUTH_URL"),
            api_key: var("INMO_API_KEY"),
            storage_url: var("INMO_STORAGE_URL"),
            geocoder_url: or_default("INMO_GEOCODER_URL", DEFAULT_NOMINATIM_URL),
            whatsapp_prefix: or_default("INMO_WHATSAPP_PREFIX", "51"),
            public_url: or_default("INMO_PUBLIC_URL", "http://localhost:3000"),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
