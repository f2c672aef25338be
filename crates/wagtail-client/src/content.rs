//! Content paths, request validation, and resolution.

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, ValidationError};
use crate::query::{serialize, QueryFilter};
use crate::transport::{CachePolicy, Transport};
use crate::types::{ContentItem, ContentList, ContentResponse};

/// Model tag the API reports for built-in images.
pub const IMAGE_TYPE: &str = "wagtailimages.Image";

/// Model tag the API reports for built-in documents.
pub const DOCUMENT_TYPE: &str = "wagtaildocs.Document";

/// Top-level resource category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFamily {
    /// `pages`
    Pages,
    /// `images`
    Images,
    /// `documents`
    Documents,
}

impl ContentFamily {
    /// Path segment of the family endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFamily::Pages => "pages",
            ContentFamily::Images => "images",
            ContentFamily::Documents => "documents",
        }
    }
}

impl fmt::Display for ContentFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pages" => Ok(ContentFamily::Pages),
            "images" => Ok(ContentFamily::Images),
            "documents" => Ok(ContentFamily::Documents),
            other => Err(Error::InvalidPath(format!("unknown content family '{}'", other))),
        }
    }
}

/// A family endpoint, optionally narrowed to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentPath {
    /// Family.
    pub family: ContentFamily,
    /// Item id for single-resource paths.
    pub id: Option<u64>,
}

impl ContentPath {
    /// The collection endpoint of a family.
    pub fn collection(family: ContentFamily) -> Self {
        Self { family, id: None }
    }

    /// A single item of a family.
    pub fn item(family: ContentFamily, id: u64) -> Self {
        Self {
            family,
            id: Some(id),
        }
    }

    /// Whether this names a collection.
    pub fn is_collection(&self) -> bool {
        self.id.is_none()
    }
}

impl From<ContentFamily> for ContentPath {
    fn from(family: ContentFamily) -> Self {
        Self::collection(family)
    }
}

impl fmt::Display for ContentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}/{}", self.family, id),
            None => write!(f, "{}", self.family),
        }
    }
}

impl FromStr for ContentPath {
    type Err = Error;

    /// Parse `pages`, `pages/42`, tolerating surrounding slashes.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim_matches('/');
        let (family, id) = match trimmed.split_once('/') {
            Some((family, id)) => (family, Some(id)),
            None => (trimmed, None),
        };
        let family = family.parse()?;
        let id = id
            .map(|id| {
                id.parse::<u64>()
                    .map_err(|_| Error::InvalidPath(format!("invalid item id in '{}'", s)))
            })
            .transpose()?;
        Ok(Self { family, id })
    }
}

/// Reject query combinations the API cannot serve.
pub fn validate(
    path: &ContentPath,
    filter: Option<&QueryFilter>,
) -> std::result::Result<(), ValidationError> {
    let Some(filter) = filter else {
        return Ok(());
    };
    if filter.is_present("order") && filter.is_present("offset") {
        return Err(ValidationError::OrderWithOffset);
    }
    if filter.has_tree_filter() && path.family != ContentFamily::Pages {
        return Err(ValidationError::TreeFilterOnNonPage {
            family: path.family,
        });
    }
    Ok(())
}

/// Build `{base_url}{api_path}/{path}/?{query}`.
pub fn resource_url(
    base_url: &str,
    api_path: &str,
    path: &ContentPath,
    filter: Option<&QueryFilter>,
) -> String {
    format!("{}{}/{}/?{}", base_url, api_path, path, serialize(filter))
}

/// Validates content requests and sends them through a [`Transport`].
#[derive(Debug, Clone)]
pub struct ContentResolver {
    base_url: String,
    api_path: String,
    transport: Transport,
}

impl ContentResolver {
    /// Create a resolver. `base_url` and `api_path` must not end with `/`.
    pub fn new(
        base_url: impl Into<String>,
        api_path: impl Into<String>,
        transport: Transport,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_path: api_path.into(),
            transport,
        }
    }

    /// URL a request for `path` with `filter` would be sent to.
    pub fn url_for(&self, path: &ContentPath, filter: Option<&QueryFilter>) -> String {
        resource_url(&self.base_url, &self.api_path, path, filter)
    }

    /// Fetch a collection or a single item.
    ///
    /// Validation happens before anything is sent; a rejected request
    /// never reaches the transport.
    pub async fn fetch(
        &self,
        path: &ContentPath,
        filter: Option<&QueryFilter>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> Result<ContentResponse> {
        match path.id {
            None => self
                .fetch_list(path.family, filter, headers, cache)
                .await
                .map(ContentResponse::List),
            Some(id) => self
                .fetch_item(path.family, id, filter, headers, cache)
                .await
                .map(ContentResponse::Item),
        }
    }

    /// Fetch the collection endpoint of `family`.
    pub async fn fetch_list(
        &self,
        family: ContentFamily,
        filter: Option<&QueryFilter>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> Result<ContentList> {
        let body = self
            .get(&ContentPath::collection(family), filter, headers, cache)
            .await?;
        Ok(ContentList::from_value(family, body)?)
    }

    /// Fetch one item of `family` by id.
    pub async fn fetch_item(
        &self,
        family: ContentFamily,
        id: u64,
        filter: Option<&QueryFilter>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> Result<ContentItem> {
        let body = self
            .get(&ContentPath::item(family, id), filter, headers, cache)
            .await?;
        Ok(ContentItem::from_value(family, body)?)
    }

    async fn get(
        &self,
        path: &ContentPath,
        filter: Option<&QueryFilter>,
        headers: &HeaderMap,
        cache: CachePolicy,
    ) -> Result<Value> {
        if let Err(err) = validate(path, filter) {
            tracing::debug!(path = %path, error = %err, "Rejected content request");
            return Err(err.into());
        }

        let url = self.url_for(path, filter);
        Ok(self
            .transport
            .request(Method::GET, &url, None, headers, cache)
            .await?)
    }
}
