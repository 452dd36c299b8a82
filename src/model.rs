//! Recipe record and the wire shapes it is decoded from.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn a response body into domain records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed decoding recipes: {0}")]
pub struct DecodeError(pub String);

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError(err.to_string())
    }
}

/// A single catalog entry. `id` is the stable key across fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub cuisine: String,
    pub name: String,
    #[serde(default)]
    pub photo_url_large: String,
    #[serde(default)]
    pub photo_url_small: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(rename = "uuid")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

impl Recipe {
    pub fn large_photo(&self) -> Option<&str> {
        non_empty(&self.photo_url_large)
    }

    pub fn small_photo(&self) -> Option<&str> {
        non_empty(&self.photo_url_small)
    }

    /// Citation link, only when it is present and parses as an absolute URL.
    pub fn source_link(&self) -> Option<Url> {
        usable_link(self.source_url.as_deref())
    }

    pub fn youtube_link(&self) -> Option<Url> {
        usable_link(self.youtube_url.as_deref())
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn usable_link(raw: Option<&str>) -> Option<Url> {
    raw.and_then(non_empty).and_then(|s| Url::parse(s).ok())
}

/// `{ "recipes": [...] }` container returned by the catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEnvelope {
    pub recipes: Vec<Recipe>,
}

/// Known response shapes. Each shape has exactly one decode path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Catalog(Vec<Recipe>),
}

impl Payload {
    pub fn decode_catalog(body: &[u8]) -> Result<Self, DecodeError> {
        let envelope: CatalogEnvelope = serde_json::from_slice(body)?;
        Ok(Payload::Catalog(envelope.recipes))
    }

    pub fn into_recipes(self) -> Vec<Recipe> {
        match self {
            Payload::Catalog(recipes) => recipes,
        }
    }
}

/// Decode a catalog body into recipes, preserving wire order.
pub fn decode_catalog(body: &[u8]) -> Result<Vec<Recipe>, DecodeError> {
    Payload::decode_catalog(body).map(Payload::into_recipes)
}
