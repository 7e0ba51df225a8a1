//! An HTTP client for the retrieval-augmented question-answering backend.

#[macro_use]
extern crate tracing;

mod cache;
mod config;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use ragchat_proto::{
    BackendConfig, BackendError, ChatBackend, ErrorKind, HealthResponse,
    QueryRequest, QueryResponse, StatsResponse,
};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use cache::ConfigCache;
pub use config::{ApiConfig, ApiConfigBuilder, DEFAULT_BASE_URL, DEFAULT_TOP_K};

/// Error type for [`HttpBackend`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    #[inline]
    fn status(code: u16) -> Self {
        let kind = ErrorKind::Status(code);
        Self::new(format!("{kind}"), kind)
    }

    #[inline]
    fn network(err: reqwest::Error) -> Self {
        Self::new(format!("{err}"), ErrorKind::Network)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

// Structured error body returned by the backend on failures.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

/// Client for the backend's `/config`, `/query`, `/health` and `/stats`
/// endpoints.
///
/// Cloning is cheap, clones share the HTTP connection pool and the
/// [`ConfigCache`].
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    config: Arc<ApiConfig>,
    cache: ConfigCache,
}

impl HttpBackend {
    /// Creates a new `HttpBackend` with a fresh configuration cache.
    #[inline]
    pub fn new(config: ApiConfig) -> Self {
        Self::with_cache(config, ConfigCache::new())
    }

    /// Creates a new `HttpBackend` that uses the given cache.
    #[inline]
    pub fn with_cache(config: ApiConfig, cache: ConfigCache) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
            cache,
        }
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns the backend configuration cache.
    #[inline]
    pub fn cache(&self) -> &ConfigCache {
        &self.cache
    }

    /// Returns the backend configuration, fetching it on first use.
    ///
    /// Concurrent callers racing on an empty cache will each hit the
    /// network; whichever finishes first is kept.
    pub async fn get_config(&self) -> Result<Arc<BackendConfig>, Error> {
        if let Some(config) = self.cache.get() {
            trace!("backend config cache hit");
            return Ok(config);
        }
        let config: BackendConfig = self.get_json("/config").await?;
        debug!("fetched backend config: {config:?}");
        Ok(self.cache.store(config))
    }

    /// Asks a question.
    ///
    /// If `top_k` is `None`, the backend's configured default is used, or
    /// the client's fallback when the configuration can't be fetched.
    pub async fn query_chat(
        &self,
        question: &str,
        top_k: Option<u32>,
    ) -> Result<QueryResponse, Error> {
        let top_k = match top_k {
            Some(top_k) => top_k,
            None => match self.get_config().await {
                Ok(config) => config.top_k,
                Err(err) => {
                    let fallback = self.config.fallback_top_k;
                    warn!(
                        "failed to fetch config, using default top_k={fallback}: {err}"
                    );
                    fallback
                }
            },
        };

        let req = QueryRequest {
            question: question.to_owned(),
            top_k: Some(top_k),
        };
        trace!("sending query: {req:?}");
        let resp = self
            .client
            .post(self.url("/query"))
            .json(&req)
            .send()
            .await
            .map_err(Error::network)?;

        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.bytes().await.unwrap_or_default();
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|body| body.detail)
                .filter(|detail| !detail.is_empty());
            return Err(match detail {
                Some(detail) => Error::new(detail, ErrorKind::Status(code)),
                None => Error::status(code),
            });
        }

        decode(resp).await
    }

    /// Checks whether the backend is up.
    #[inline]
    pub async fn check_health(&self) -> Result<HealthResponse, Error> {
        self.get_json("/health").await
    }

    /// Returns backend statistics.
    #[inline]
    pub async fn get_stats(&self) -> Result<StatsResponse, Error> {
        self.get_json("/stats").await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, Error> {
        trace!("GET {path}");
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(Error::network)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::status(status.as_u16()));
        }
        decode(resp).await
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }
}

impl ChatBackend for HttpBackend {
    type Error = Error;

    fn query(
        &self,
        question: &str,
        top_k: Option<u32>,
    ) -> impl Future<Output = Result<QueryResponse, Self::Error>> + Send + 'static
    {
        let this = self.clone();
        let question = question.to_owned();
        async move { this.query_chat(&question, top_k).await }
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    resp.json::<T>()
        .await
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::InvalidResponse))
}
