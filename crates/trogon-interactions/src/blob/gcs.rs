//! Google Cloud Storage backend for [`BlobStore`].
//!
//! Uses the XML API with an HMAC key pair and V4 query-string signing
//! (`GOOG4-HMAC-SHA256`), so no service-account JSON or OAuth round trip is
//! needed:
//!
//! - `signed_url` is computed locally.
//! - `exists` issues a `HEAD` against a short-lived signed URL.
//!
//! Object `sprites/mew.png` in bucket `media` maps to
//! `{endpoint}/media/sprites/mew.png?X-Goog-Algorithm=…&X-Goog-Signature=…`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode, Url};
use sha2::{Digest, Sha256};

use super::{BlobError, BlobStore};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const SCOPE_SUFFIX: &str = "auto/storage/goog4_request";
/// GCS rejects signed URLs valid for longer than seven days.
const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const EXISTS_URL_TTL: Duration = Duration::from_secs(60);

/// Connection settings for [`GcsBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcsConfig {
    pub bucket: String,
    pub access_id: String,
    pub secret: String,
    pub endpoint: String,
}

impl GcsConfig {
    pub fn new(
        bucket: impl Into<String>,
        access_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            access_id: access_id.into(),
            secret: secret.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point at another endpoint (emulators, integration tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

pub struct GcsBlobStore {
    client: Client,
    config: GcsConfig,
    /// `scheme://host[:port]` of the endpoint, without a trailing slash.
    origin: String,
    /// Value of the signed `host` header.
    host: String,
}

impl GcsBlobStore {
    pub fn new(config: GcsConfig) -> Result<Self, BlobError> {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: GcsConfig, client: Client) -> Result<Self, BlobError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| BlobError::Signing(format!("invalid endpoint {}: {e}", config.endpoint)))?;
        let host_name = endpoint
            .host_str()
            .ok_or_else(|| BlobError::Signing(format!("endpoint {} has no host", config.endpoint)))?;
        let host = match endpoint.port() {
            Some(port) => format!("{host_name}:{port}"),
            None => host_name.to_string(),
        };
        let origin = format!("{}://{}", endpoint.scheme(), host);

        Ok(Self {
            client,
            config,
            origin,
            host,
        })
    }

    fn canonical_uri(&self, path: &str) -> String {
        let object = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}/{}", urlencoding::encode(&self.config.bucket), object)
    }

    /// Build a V4 signed URL for `method` on `path`, valid for `ttl` from `now`.
    pub fn sign_at(
        &self,
        method: &str,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, BlobError> {
        if ttl.is_zero() || ttl > MAX_TTL {
            return Err(BlobError::Signing(format!(
                "ttl must be between 1s and {}s, got {}s",
                MAX_TTL.as_secs(),
                ttl.as_secs()
            )));
        }

        let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{SCOPE_SUFFIX}");
        let credential = format!("{}/{scope}", self.config.access_id);

        // Parameters must appear in sorted order; these already are.
        let query = [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", datetime.clone()),
            ("X-Goog-Expires", ttl.as_secs().to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        let uri = self.canonical_uri(path);
        let canonical_headers = format!("host:{}\n", self.host);
        let canonical_request = [
            method,
            uri.as_str(),
            query.as_str(),
            canonical_headers.as_str(),
            "host",
            "UNSIGNED-PAYLOAD",
        ]
        .join("\n");

        let request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = [ALGORITHM, datetime.as_str(), scope.as_str(), request_hash.as_str()]
            .join("\n");

        let signature = hex::encode(self.signing_key(&date)?.sign(string_to_sign.as_bytes())?);

        Ok(format!(
            "{}{uri}?{query}&X-Goog-Signature={signature}",
            self.origin
        ))
    }

    fn signing_key(&self, date: &str) -> Result<SigningKey, BlobError> {
        let mut key = SigningKey(format!("GOOG4{}", self.config.secret).into_bytes());
        for part in [date, "auto", "storage", "goog4_request"] {
            key = SigningKey(key.sign(part.as_bytes())?);
        }
        Ok(key)
    }
}

struct SigningKey(Vec<u8>);

impl SigningKey {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, BlobError> {
        let mut mac = HmacSha256::new_from_slice(&self.0)
            .map_err(|e| BlobError::Signing(e.to_string()))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl BlobStore for GcsBlobStore {
    async fn exists(&self, path: &str) -> Result<bool, BlobError> {
        let url = self.sign_at("HEAD", path, EXISTS_URL_TTL, Utc::now())?;
        let resp = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|e| BlobError::Transport(e.to_string()))?;

        match resp.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(BlobError::Api {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            }),
        }
    }

    async fn signed_url(&self, path: &str, ttl: Duration) -> Result<String, BlobError> {
        self.sign_at("GET", path, ttl, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HOUR: Duration = Duration::from_secs(3600);

    fn store(endpoint: &str) -> GcsBlobStore {
        GcsBlobStore::new(
            GcsConfig::new("media", "GOOG1EXAMPLE", "secret-key").with_endpoint(endpoint),
        )
        .unwrap()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn query_value<'a>(url: &'a str, key: &str) -> Option<&'a str> {
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix(key)?.strip_prefix('='))
    }

    #[test]
    fn signed_url_has_v4_parameters() {
        let url = store(DEFAULT_ENDPOINT)
            .sign_at("GET", "sprites/mew.png", HOUR, at())
            .unwrap();

        assert!(url.starts_with("https://storage.googleapis.com/media/sprites/mew.png?"));
        assert_eq!(query_value(&url, "X-Goog-Algorithm"), Some("GOOG4-HMAC-SHA256"));
        assert_eq!(
            query_value(&url, "X-Goog-Credential"),
            Some("GOOG1EXAMPLE%2F20240501%2Fauto%2Fstorage%2Fgoog4_request")
        );
        assert_eq!(query_value(&url, "X-Goog-Date"), Some("20240501T120000Z"));
        assert_eq!(query_value(&url, "X-Goog-Expires"), Some("3600"));
        assert_eq!(query_value(&url, "X-Goog-SignedHeaders"), Some("host"));

        let signature = query_value(&url, "X-Goog-Signature").unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signing_is_deterministic_for_the_same_instant() {
        let s = store(DEFAULT_ENDPOINT);
        let a = s.sign_at("GET", "cries/mew.mp3", HOUR, at()).unwrap();
        let b = s.sign_at("GET", "cries/mew.mp3", HOUR, at()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn signature_depends_on_method_path_and_time() {
        let s = store(DEFAULT_ENDPOINT);
        let base = s.sign_at("GET", "cries/mew.mp3", HOUR, at()).unwrap();
        let sig = |url: &str| query_value(url, "X-Goog-Signature").unwrap().to_string();

        let head = s.sign_at("HEAD", "cries/mew.mp3", HOUR, at()).unwrap();
        let other_path = s.sign_at("GET", "cries/mewtwo.mp3", HOUR, at()).unwrap();
        let later = s
            .sign_at("GET", "cries/mew.mp3", HOUR, at() + chrono::Duration::seconds(1))
            .unwrap();

        assert_ne!(sig(&base), sig(&head));
        assert_ne!(sig(&base), sig(&other_path));
        assert_ne!(sig(&base), sig(&later));
    }

    #[test]
    fn signature_depends_on_secret() {
        let other = GcsBlobStore::new(GcsConfig::new("media", "GOOG1EXAMPLE", "other-secret"))
            .unwrap();
        let a = store(DEFAULT_ENDPOINT)
            .sign_at("GET", "a.png", HOUR, at())
            .unwrap();
        let b = other.sign_at("GET", "a.png", HOUR, at()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn object_segments_are_percent_encoded() {
        let url = store(DEFAULT_ENDPOINT)
            .sign_at("GET", "samples/audio/my sample.mp3", HOUR, at())
            .unwrap();
        assert!(url.contains("/media/samples/audio/my%20sample.mp3?"));
    }

    #[test]
    fn ttl_bounds_are_enforced() {
        let s = store(DEFAULT_ENDPOINT);
        assert!(matches!(
            s.sign_at("GET", "a", Duration::ZERO, at()),
            Err(BlobError::Signing(_))
        ));
        assert!(matches!(
            s.sign_at("GET", "a", MAX_TTL + Duration::from_secs(1), at()),
            Err(BlobError::Signing(_))
        ));
        assert!(s.sign_at("GET", "a", MAX_TTL, at()).is_ok());
    }

    #[test]
    fn endpoint_port_is_part_of_origin() {
        let url = store("http://127.0.0.1:9023")
            .sign_at("GET", "a.png", HOUR, at())
            .unwrap();
        assert!(url.starts_with("http://127.0.0.1:9023/media/a.png?"));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = GcsBlobStore::new(GcsConfig::new("b", "id", "s").with_endpoint("not a url"));
        assert!(matches!(result, Err(BlobError::Signing(_))));
    }

    #[tokio::test]
    async fn exists_true_on_200() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(httpmock::Method::HEAD)
                    .path("/media/sprites/mew.png")
                    .query_param("X-Goog-Algorithm", "GOOG4-HMAC-SHA256")
                    .query_param_exists("X-Goog-Signature");
                then.status(200);
            })
            .await;

        assert!(store(&server.base_url()).exists("sprites/mew.png").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exists_false_on_404() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::HEAD).path("/media/cries/nope.mp3");
                then.status(404);
            })
            .await;

        assert!(!store(&server.base_url()).exists("cries/nope.mp3").await.unwrap());
    }

    #[tokio::test]
    async fn exists_api_error_on_403() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(httpmock::Method::HEAD).path("/media/a.png");
                then.status(403);
            })
            .await;

        let err = store(&server.base_url()).exists("a.png").await.unwrap_err();
        assert_eq!(
            err,
            BlobError::Api {
                status: 403,
                message: "Forbidden".to_string()
            }
        );
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn exists_transport_error_when_unreachable() {
        // Nothing listens on port 1.
        let err = store("http://127.0.0.1:1").exists("a.png").await.unwrap_err();
        assert!(matches!(err, BlobError::Transport(_)));
    }

    #[tokio::test]
    async fn signed_url_makes_no_network_call() {
        let server = httpmock::MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(500);
            })
            .await;

        let url = store(&server.base_url())
            .signed_url("a.png", HOUR)
            .await
            .unwrap();
        assert!(url.contains("X-Goog-Expires=3600"));
        mock.assert_hits_async(0).await;
    }
}
