use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::Remote;
use crate::model::{self, Recipe};

pub const DEFAULT_USER_AGENT: &str = "recipe-fetch/0.1";

/// Why a catalog fetch failed. Causes are kept as descriptions so the error
/// can be cloned into observable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("catalog endpoint is missing or not a valid URL")]
    InvalidEndpoint,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("client error: HTTP {0}")]
    ClientError(u16),
    #[error("server error: HTTP {0}")]
    ServerError(u16),
    #[error("unexpected HTTP status {0}")]
    UnknownStatus(u16),
    #[error("failed decoding recipes: {0}")]
    DecodeFailed(String),
}

/// Anything that can produce the full recipe catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Recipe>, FetchError>;
}

/// Map a status code onto the standard HTTP classes.
/// `3xx` passes only when `allow_redirect` is set.
pub fn classify_status(code: u16, allow_redirect: bool) -> Result<(), FetchError> {
    match code {
        200..=299 => Ok(()),
        300..=399 if allow_redirect => Ok(()),
        400..=499 => Err(FetchError::ClientError(code)),
        500..=599 => Err(FetchError::ServerError(code)),
        _ => Err(FetchError::UnknownStatus(code)),
    }
}

/// 204 No Content and 205 Reset Content never carry a catalog. Every other
/// success must decode, so an empty 200 body is a decode failure.
pub fn is_bodiless(code: u16) -> bool {
    matches!(code, 204 | 205)
}

/// Parse the configured endpoint; only absolute http(s) URLs with a host pass.
pub fn parse_endpoint(raw: Option<&str>) -> Result<Url, FetchError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let url = raw
        .and_then(|s| Url::parse(s).ok())
        .ok_or(FetchError::InvalidEndpoint)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(FetchError::InvalidEndpoint);
    }
    Ok(url)
}

fn describe_transport(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        format!("connect: {}", err)
    } else {
        err.to_string()
    }
}

/// Stateless HTTP client for the recipe catalog endpoint.
#[derive(Clone)]
pub struct RecipeClient {
    http: Client,
    endpoint: Option<String>,
    allow_redirect_status: bool,
}

impl fmt::Debug for RecipeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipeClient")
            .field("endpoint", &self.endpoint)
            .field("allow_redirect_status", &self.allow_redirect_status)
            .finish_non_exhaustive()
    }
}

impl RecipeClient {
    pub fn from_config(remote: &Remote) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(remote.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT))
            .timeout(remote.timeout())
            .build()
            .map_err(|err| FetchError::Transport(describe_transport(&err)))?;
        Ok(Self {
            http,
            endpoint: remote.endpoint.clone(),
            allow_redirect_status: remote.allow_redirect_status,
        })
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn build_request(&self) -> Result<reqwest::Request, FetchError> {
        let url = parse_endpoint(self.endpoint.as_deref())?;
        self.http
            .get(url)
            .header("Accept", "application/json")
            .build()
            .map_err(|_| FetchError::InvalidEndpoint)
    }

    #[instrument(skip_all)]
    pub async fn fetch_catalog(&self) -> Result<Vec<Recipe>, FetchError> {
        let request = self.build_request()?;
        debug!(url = %request.url(), "fetching recipe catalog");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|err| FetchError::Transport(describe_transport(&err)))?;

        let status = res.status().as_u16();
        classify_status(status, self.allow_redirect_status)?;
        if is_bodiless(status) {
            debug!(status, "catalog response has no content");
            return Ok(Vec::new());
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| FetchError::Transport(describe_transport(&err)))?;
        debug!(status, bytes = body.len(), "catalog response received");
        model::decode_catalog(&body).map_err(|err| FetchError::DecodeFailed(err.0))
    }
}

#[async_trait]
impl CatalogSource for RecipeClient {
    async fn fetch_catalog(&self) -> Result<Vec<Recipe>, FetchError> {
        RecipeClient::fetch_catalog(self).await
    }
}
