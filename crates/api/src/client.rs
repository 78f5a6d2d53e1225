//! Generic JSON request plumbing shared by every endpoint group.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::cache::{CacheKey, CacheValue};
use crate::config::ApiConfig;
use crate::{ApiError, Result};

/// Header carrying the correlation ID to the backend.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

tokio::task_local! {
    static REQUEST_ID: String;
}

/// Run `fut` with `request_id` attached to every backend call it makes.
pub async fn with_request_id<F: Future>(request_id: String, fut: F) -> F::Output {
    REQUEST_ID.scope(request_id, fut).await
}

// =============================================================================
// BackendSession
// =============================================================================

/// The backend's authentication cookie for one signed-in user.
///
/// Captured from `Set-Cookie` on login or registration and replayed as the
/// `Cookie` header afterwards. It is serializable so it can live in the
/// browser session; `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendSession(String);

impl BackendSession {
    /// Wrap a ready-made `Cookie` header value.
    #[must_use]
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Build from `Set-Cookie` header values, keeping only `name=value`
    /// pairs. Returns `None` when no cookie was set.
    pub fn from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let pairs: Vec<&str> = values
            .into_iter()
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self(pairs.join("; ")))
        }
    }

    /// Value for the `Cookie` request header.
    #[must_use]
    pub fn cookie_header(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BackendSession([REDACTED])")
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    cache: Option<Cache<CacheKey, CacheValue>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("cache", &self.inner.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let cache = (!config.cache_ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(1000)
                .time_to_live(config.cache_ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// Absolute URL for an API path such as `/api/products`.
    fn url(&self, path: &str) -> Result<Url> {
        let full = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        Url::parse(&full).map_err(|e| ApiError::Network(format!("invalid URL {full}: {e}")))
    }

    /// Resolve an image reference from the backend.
    ///
    /// Uploads come back as paths such as `/uploads/mug.png`; absolute URLs
    /// are returned unchanged.
    #[must_use]
    pub fn asset_url(&self, reference: &str) -> String {
        if reference.starts_with("http://")
            || reference.starts_with("https://")
            || reference.starts_with("data:")
        {
            reference.to_string()
        } else {
            format!(
                "{}/{}",
                self.inner.base_url,
                reference.trim_start_matches('/')
            )
        }
    }

    /// Backend origin, for content security policies.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Start a request, attaching the backend cookie when present.
    pub(crate) fn builder(
        &self,
        method: Method,
        path: &str,
        session: Option<&BackendSession>,
    ) -> Result<RequestBuilder> {
        let mut builder = self.inner.http.request(method, self.url(path)?);
        if let Ok(id) = REQUEST_ID.try_with(Clone::clone) {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        if let Some(session) = session {
            builder = builder.header(COOKIE, session.cookie_header());
        }
        Ok(builder)
    }

    /// Send a request and turn non-success statuses into errors.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|e| {
            let err = ApiError::from(e);
            tracing::warn!(error = %err, "Backend request failed");
            err
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_response(status, &body);
        if err.is_server_side() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            tracing::debug!(status = %status, error = %err, "Backend rejected request");
        }
        Err(err)
    }

    /// Decode a JSON response body.
    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::from(e)
        })
    }

    /// Issue a JSON request and decode the JSON response.
    ///
    /// This is the one entry point every endpoint group funnels through.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-success statuses
    /// and bodies that do not decode as `T`.
    #[instrument(skip(self, body, session), fields(authenticated = session.is_some()))]
    pub async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        session: Option<&BackendSession>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut builder = self.builder(method, path, session)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    /// Issue a request whose response body carries nothing the caller needs.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures and non-success
    /// statuses.
    #[instrument(skip(self, body, session), fields(authenticated = session.is_some()))]
    pub async fn request_empty<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        session: Option<&BackendSession>,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.builder(method, path, session)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder).await?;
        Ok(())
    }

    /// `GET` shorthand.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&BackendSession>,
    ) -> Result<T> {
        self.request::<(), T>(Method::GET, path, None, session).await
    }

    // -------------------------------------------------------------------------
    // Cache helpers
    // -------------------------------------------------------------------------

    pub(crate) async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        match &self.inner.cache {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub(crate) async fn store(&self, key: CacheKey, value: CacheValue) {
        if let Some(cache) = &self.inner.cache {
            cache.insert(key, value).await;
        }
    }

    pub(crate) async fn invalidate(&self, keys: &[CacheKey]) {
        if let Some(cache) = &self.inner.cache {
            for key in keys {
                cache.invalidate(key).await;
            }
        }
    }

    /// Capture the backend cookie from a login/registration response.
    pub(crate) fn capture_session(response: &Response) -> Option<BackendSession> {
        BackendSession::from_set_cookie(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok()),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_from_set_cookie_keeps_pairs_only() {
        let session = BackendSession::from_set_cookie([
            "connect.sid=s%3Aabc.def; Path=/; HttpOnly; SameSite=Lax",
            "csrf=xyz; Path=/",
        ])
        .unwrap();
        assert_eq!(session.cookie_header(), "connect.sid=s%3Aabc.def; csrf=xyz");
    }

    #[test]
    fn test_session_from_empty_set_cookie() {
        assert!(BackendSession::from_set_cookie(Vec::<&str>::new()).is_none());
        assert!(BackendSession::from_set_cookie(["; Path=/"]).is_none());
    }

    #[test]
    fn test_session_debug_is_redacted() {
        let session = BackendSession::new("sid=secret");
        assert!(!format!("{session:?}").contains("secret"));
    }

    #[test]
    fn test_session_serializes_as_string() {
        let session = BackendSession::new("sid=1");
        assert_eq!(serde_json::to_string(&session).unwrap(), "\"sid=1\"");
    }

    #[test]
    fn test_url_joins_paths() {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:4000/").unwrap());
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/products/3").unwrap().as_str(),
            "http://127.0.0.1:4000/api/products/3"
        );

        let config = ApiConfig::new(Url::parse("https://example.com/backend").unwrap());
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/cart").unwrap().as_str(),
            "https://example.com/backend/api/cart"
        );
    }

    #[test]
    fn test_asset_url() {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:4000").unwrap());
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.asset_url("/uploads/mug.png"),
            "http://127.0.0.1:4000/uploads/mug.png"
        );
        assert_eq!(
            client.asset_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[tokio::test]
    async fn test_request_id_forwarded_inside_scope() {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:4000").unwrap());
        let client = ApiClient::new(&config).unwrap();

        let outside = client
            .builder(Method::GET, "/api/cart", None)
            .unwrap()
            .build()
            .unwrap();
        assert!(outside.headers().get(REQUEST_ID_HEADER).is_none());

        let inside = with_request_id("req-42".to_string(), async {
            client
                .builder(Method::GET, "/api/cart", None)
                .unwrap()
                .build()
                .unwrap()
        })
        .await;
        assert_eq!(inside.headers().get(REQUEST_ID_HEADER).unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let config = ApiConfig::new(Url::parse("http://127.0.0.1:9").unwrap())
            .with_timeout(std::time::Duration::from_secs(2));
        let client = ApiClient::new(&config).unwrap();
        let result: Result<serde_json::Value> = client.get("/api/settings", None).await;
        assert!(matches!(
            result,
            Err(ApiError::Network(_) | ApiError::Timeout)
        ));
    }
}
