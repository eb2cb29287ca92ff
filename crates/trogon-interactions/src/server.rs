use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use discord_interactions_types::InteractionResponse;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::blob::BlobStore;
use crate::catalog::{Catalog, CatalogError};
use crate::commands::default_registry;
use crate::config::InteractionsConfig;
use crate::dispatcher::Dispatcher;
use crate::media::MediaResolver;
use crate::registry::RegistryError;
use crate::signature::{InteractionVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    verifier: Arc<InteractionVerifier>,
    started: Instant,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>, verifier: InteractionVerifier) -> Self {
        Self {
            dispatcher,
            verifier: Arc::new(verifier),
            started: Instant::now(),
        }
    }
}

/// Rejections issued before a request reaches the dispatcher.
///
/// Bodies are fixed strings; the cause is only logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionRejection {
    Unauthorized,
    BadRequest,
}

impl IntoResponse for InteractionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "invalid request signature").into_response()
            }
            Self::BadRequest => {
                (StatusCode::BAD_REQUEST, "invalid interaction payload").into_response()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime_secs: u64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .route("/health", get(health_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Starts the interactions webhook server.
///
/// Loads the catalogs, builds the command registry and media resolver over
/// `store`, then listens for `POST /interactions` on `config.port`.
pub async fn serve<S: BlobStore + 'static>(
    config: InteractionsConfig,
    store: S,
) -> Result<(), ServeError> {
    let pokemon = load_catalog(config.pokemon_catalog.as_deref(), Catalog::pokemon)?;
    let samples = load_catalog(config.sample_catalog.as_deref(), Catalog::samples)?;
    let registry = default_registry(pokemon, samples)?;
    let commands = registry.names().collect::<Vec<_>>().join(", ");
    info!(commands = %commands, "Command registry ready");

    let resolver = MediaResolver::new(Arc::new(store))
        .with_url_ttl(config.media_url_ttl)
        .with_call_timeout(config.media_call_timeout);
    let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(resolver));
    let app = router(AppState::new(Arc::new(dispatcher), config.verifier));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "Discord interactions server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn load_catalog(
    path: Option<&Path>,
    bundled: fn() -> Catalog,
) -> Result<Arc<Catalog>, CatalogError> {
    let catalog = match path {
        Some(path) => {
            let catalog = Catalog::from_file(path)?;
            info!(path = %path.display(), names = catalog.len(), "Loaded catalog");
            catalog
        }
        None => bundled(),
    };
    Ok(Arc::new(catalog))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[instrument(
    name = "discord.interaction",
    skip_all,
    fields(
        interaction = tracing::field::Empty,
        command = tracing::field::Empty,
    )
)]
async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InteractionResponse>, InteractionRejection> {
    let (Some(signature), Some(timestamp)) = (
        header(&headers, SIGNATURE_HEADER),
        header(&headers, TIMESTAMP_HEADER),
    ) else {
        warn!("Missing X-Signature-Ed25519 or X-Signature-Timestamp header");
        return Err(InteractionRejection::Unauthorized);
    };

    if !state.verifier.verify(timestamp, &body, signature) {
        warn!("Invalid interaction signature");
        return Err(InteractionRejection::Unauthorized);
    }

    match state.dispatcher.dispatch_payload(&body).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(error = %e, "Rejected interaction body");
            Err(InteractionRejection::BadRequest)
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        uptime_secs: state.started.elapsed().as_secs(),
    })
}

async fn live_handler() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use axum::http::HeaderValue;
    use ed25519_dalek::{Signer, SigningKey};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TIMESTAMP: &str = "1700000000";

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[3; 32])
    }

    fn state(store: &MemoryBlobStore) -> AppState {
        let registry =
            default_registry(Arc::new(Catalog::pokemon()), Arc::new(Catalog::samples())).unwrap();
        let resolver = MediaResolver::new(Arc::new(store.clone()));
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(resolver));
        let verifier =
            InteractionVerifier::from_hex(&hex::encode(signing_key().verifying_key().as_bytes()))
                .unwrap();
        AppState::new(Arc::new(dispatcher), verifier)
    }

    fn signed_headers(body: &[u8]) -> HeaderMap {
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(body);
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, HeaderValue::from_str(&signature).unwrap());
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from_static(TIMESTAMP));
        headers
    }

    async fn post(
        state: AppState,
        headers: HeaderMap,
        body: &'static [u8],
    ) -> Result<InteractionResponse, InteractionRejection> {
        handle_interaction(State(state), headers, Bytes::from_static(body))
            .await
            .map(|Json(response)| response)
    }

    #[tokio::test]
    async fn signed_ping_is_answered() {
        let body = br#"{"type":1}"#;
        let response = post(state(&MemoryBlobStore::new()), signed_headers(body), body)
            .await
            .unwrap();
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"type":1}"#);
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let result = post(
            state(&MemoryBlobStore::new()),
            HeaderMap::new(),
            br#"{"type":1}"#,
        )
        .await;
        assert_eq!(result.unwrap_err(), InteractionRejection::Unauthorized);
    }

    #[tokio::test]
    async fn tampered_body_is_unauthorized_and_never_dispatched() {
        let store = MemoryBlobStore::with_objects(["sprites/mew.png"]);
        let headers = signed_headers(br#"{"type":1}"#);
        let body = br#"{"type":2,"data":{"name":"pkmn","options":[{"name":"name","type":3,"value":"mew"}]}}"#;

        let result = post(state(&store), headers, body).await;
        assert_eq!(result.unwrap_err(), InteractionRejection::Unauthorized);
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn signed_garbage_is_a_bad_request() {
        let body = b"{\"hello\":";
        let result = post(state(&MemoryBlobStore::new()), signed_headers(body), body).await;
        assert_eq!(result.unwrap_err(), InteractionRejection::BadRequest);
    }

    #[test]
    fn rejections_map_to_status_codes() {
        assert_eq!(
            InteractionRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            InteractionRejection::BadRequest.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(health) = health_handler(State(state(&MemoryBlobStore::new()))).await;
        assert_eq!(health.status, "ok");
        assert!(chrono::DateTime::parse_from_rfc3339(&health.timestamp).is_ok());
        assert_eq!(live_handler().await, StatusCode::OK);
    }

    #[test]
    fn catalog_override_replaces_bundled_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "kick\nsnare").unwrap();

        let catalog = load_catalog(Some(file.path()), Catalog::samples).unwrap();
        assert_eq!(catalog.names(), ["kick", "snare"]);

        let bundled = load_catalog(None, Catalog::samples).unwrap();
        assert_eq!(bundled.len(), 3);
    }
}
