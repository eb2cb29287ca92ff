use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::blob::GcsConfig;
use crate::blob::gcs::DEFAULT_ENDPOINT;
use crate::env::ReadEnv;
use crate::signature::{InteractionVerifier, PublicKeyError};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_URL_TTL_SECS: u64 = 60 * 60;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 1;
/// Longest validity V4 signed URLs accept.
const MAX_URL_TTL_SECS: u64 = 7 * 24 * 60 * 60;
const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("DISCORD_PUBLIC_KEY is invalid: {0}")]
    PublicKey(#[from] PublicKeyError),

    #[error("unknown BLOB_BACKEND {0:?}, expected \"gcs\" or \"memory\"")]
    UnknownBackend(String),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where media objects are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    Gcs(GcsConfig),
    /// Empty in-process store; for local runs without cloud credentials.
    Memory,
}

/// Configuration for the interactions webhook server.
///
/// Resolved from environment variables:
/// - `DISCORD_PUBLIC_KEY`: hex Ed25519 public key of the application (required)
/// - `INTERACTIONS_PORT`: HTTP listening port (default: 8080)
/// - `MEDIA_URL_TTL_SECS`: validity of issued media URLs, 1 to 604800 (default: 3600)
/// - `MEDIA_CALL_TIMEOUT_SECS`: bound on each blob store call, at least 1 (default: 1)
/// - `BLOB_BACKEND`: `gcs` (default) or `memory`
/// - `GCS_BUCKET`, `GCS_HMAC_ACCESS_ID`, `GCS_HMAC_SECRET`: required for `gcs`
/// - `GCS_ENDPOINT`: storage endpoint (default: `https://storage.googleapis.com`)
/// - `PKMN_CATALOG_PATH`, `SAMPLE_CATALOG_PATH`: replace the bundled catalogs
#[derive(Debug, Clone)]
pub struct InteractionsConfig {
    pub verifier: InteractionVerifier,
    pub port: u16,
    pub media_url_ttl: Duration,
    pub media_call_timeout: Duration,
    pub blob: BlobBackend,
    pub pokemon_catalog: Option<PathBuf>,
    pub sample_catalog: Option<PathBuf>,
}

impl InteractionsConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, ConfigError> {
        let public_key = env
            .non_empty("DISCORD_PUBLIC_KEY")
            .ok_or(ConfigError::Missing("DISCORD_PUBLIC_KEY"))?;

        let url_ttl_secs = env.parse_or("MEDIA_URL_TTL_SECS", DEFAULT_URL_TTL_SECS);
        if !(1..=MAX_URL_TTL_SECS).contains(&url_ttl_secs) {
            return Err(ConfigError::Invalid {
                key: "MEDIA_URL_TTL_SECS",
                reason: format!("{url_ttl_secs} is outside 1..={MAX_URL_TTL_SECS}"),
            });
        }

        let call_timeout_secs = env.parse_or("MEDIA_CALL_TIMEOUT_SECS", DEFAULT_CALL_TIMEOUT_SECS);
        if call_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "MEDIA_CALL_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            verifier: InteractionVerifier::from_hex(&public_key)?,
            port: env.parse_or("INTERACTIONS_PORT", DEFAULT_PORT),
            media_url_ttl: Duration::from_secs(url_ttl_secs),
            media_call_timeout: Duration::from_secs(call_timeout_secs),
            blob: blob_backend(env)?,
            pokemon_catalog: env.non_empty("PKMN_CATALOG_PATH").map(PathBuf::from),
            sample_catalog: env.non_empty("SAMPLE_CATALOG_PATH").map(PathBuf::from),
        })
    }
}

fn blob_backend<E: ReadEnv>(env: &E) -> Result<BlobBackend, ConfigError> {
    let backend = env
        .non_empty("BLOB_BACKEND")
        .map(|b| b.trim().to_lowercase())
        .unwrap_or_else(|| "gcs".to_string());

    match backend.as_str() {
        "memory" => Ok(BlobBackend::Memory),
        "gcs" => {
            let required = |key: &'static str| env.non_empty(key).ok_or(ConfigError::Missing(key));
            let config = GcsConfig::new(
                required("GCS_BUCKET")?,
                required("GCS_HMAC_ACCESS_ID")?,
                required("GCS_HMAC_SECRET")?,
            )
            .with_endpoint(
                env.non_empty("GCS_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            );
            Ok(BlobBackend::Gcs(config))
        }
        _ => Err(ConfigError::UnknownBackend(backend)),
    }
}

/// Credentials for bulk command registration.
///
/// - `DISCORD_APP_ID`, `DISCORD_BOT_TOKEN`: required; `DISCORD_TOKEN` is
///   accepted when `DISCORD_BOT_TOKEN` is unset
/// - `DISCORD_GUILD_ID`: register in one guild instead of globally
/// - `DISCORD_API_BASE`: API root (default: `https://discord.com/api/v10`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConfig {
    pub app_id: String,
    pub bot_token: String,
    pub guild_id: Option<String>,
    pub api_base: String,
}

impl RegisterConfig {
    pub fn from_env<E: ReadEnv>(env: &E) -> Result<Self, ConfigError> {
        Ok(Self {
            app_id: env
                .non_empty("DISCORD_APP_ID")
                .ok_or(ConfigError::Missing("DISCORD_APP_ID"))?,
            bot_token: env
                .non_empty("DISCORD_BOT_TOKEN")
                .or_else(|| env.non_empty("DISCORD_TOKEN"))
                .ok_or(ConfigError::Missing("DISCORD_BOT_TOKEN"))?,
            guild_id: env.non_empty("DISCORD_GUILD_ID"),
            api_base: env
                .non_empty("DISCORD_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}
