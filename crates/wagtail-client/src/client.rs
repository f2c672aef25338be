//! Main client implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{DocumentsApi, ImagesApi, PagesApi};
use crate::content::{ContentFamily, ContentPath, ContentResolver, DOCUMENT_TYPE, IMAGE_TYPE};
use crate::error::{Error, Result};
use crate::query::QueryFilter;
use crate::transport::{
    CachePolicy, DiagnosticSink, HttpBackend, ReqwestBackend, TracingSink, Transport,
};
use crate::types::{ContentItem, ContentList, ContentResponse, MediaMeta};

/// Default API mount point.
pub const DEFAULT_API_PATH: &str = "/api/v2";

/// Message of a lookup that failed for a reason other than absence.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Client configuration.
///
/// None of `base_url`, `api_path` and `media_base_url` may end with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Site origin, e.g. `https://cms.example.com`.
    pub base_url: String,
    /// API mount point, e.g. `/api/v2`.
    #[serde(default = "default_api_path")]
    pub api_path: String,
    /// Origin media files are served from, when it differs from `base_url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_base_url: Option<String>,
    /// Headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Cache policy used when a call does not override it.
    #[serde(default)]
    pub cache_policy: CachePolicy,
}

fn default_api_path() -> String {
    DEFAULT_API_PATH.to_string()
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_path: default_api_path(),
            media_base_url: None,
            headers: BTreeMap::new(),
            cache_policy: CachePolicy::default(),
        }
    }

    /// Check the trailing-separator rule and the base URL.
    pub fn validate(&self) -> Result<()> {
        reject_trailing_slash("base_url", &self.base_url)?;
        reject_trailing_slash("api_path", &self.api_path)?;
        if let Some(media) = &self.media_base_url {
            reject_trailing_slash("media_base_url", media)?;
            Url::parse(media)
                .map_err(|e| Error::Config(format!("media_base_url is not a URL: {}", e)))?;
        }
        Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("base_url is not a URL: {}", e)))?;
        Ok(())
    }
}

fn reject_trailing_slash(field: &str, value: &str) -> Result<()> {
    if value.ends_with('/') {
        return Err(Error::Config(format!("{} must not end with '/'", field)));
    }
    Ok(())
}

fn header_map(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::Config(format!("invalid header name '{}'", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::Config(format!("invalid value for header '{}'", name)))?;
        map.insert(name, value);
    }
    Ok(map)
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-call options
// ─────────────────────────────────────────────────────────────────────────────

/// Per-call headers and cache override.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Headers merged over the configured defaults; these win.
    pub headers: HeaderMap,
    /// Cache policy override.
    pub cache: Option<CachePolicy>,
}

impl RequestOptions {
    /// No extra headers, configured cache policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Override the cache policy.
    pub fn cache(mut self, cache: CachePolicy) -> Self {
        self.cache = Some(cache);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lookup results
// ─────────────────────────────────────────────────────────────────────────────

/// How to identify a single item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Numeric id.
    Id(u64),
    /// Slug.
    Slug(String),
    /// A negative id. Resolves to not found without a request.
    NegativeId(i64),
}

impl From<u64> for Lookup {
    fn from(id: u64) -> Self {
        Lookup::Id(id)
    }
}

impl From<u32> for Lookup {
    fn from(id: u32) -> Self {
        Lookup::Id(u64::from(id))
    }
}

impl From<i32> for Lookup {
    fn from(id: i32) -> Self {
        match u64::try_from(id) {
            Ok(id) => Lookup::Id(id),
            Err(_) => Lookup::NegativeId(i64::from(id)),
        }
    }
}

impl From<&str> for Lookup {
    fn from(slug: &str) -> Self {
        Lookup::Slug(slug.to_string())
    }
}

impl From<String> for Lookup {
    fn from(slug: String) -> Self {
        Lookup::Slug(slug)
    }
}

/// What a failed lookup saw.
#[derive(Debug)]
pub enum NotFoundData {
    /// The listing that came back with no items.
    Empty(ContentList),
    /// The error that ended the lookup.
    Error(Error),
}

/// An identity lookup that produced no item.
#[derive(Debug)]
pub struct NotFound {
    /// Human-readable reason.
    pub message: String,
    /// Raw listing or error, for inspection.
    pub data: NotFoundData,
}

impl NotFound {
    fn missing(family: ContentFamily, data: NotFoundData) -> Self {
        Self {
            message: not_found_message(family),
            data,
        }
    }

    fn unknown(error: Error) -> Self {
        Self {
            message: UNKNOWN_ERROR_MESSAGE.to_string(),
            data: NotFoundData::Error(error),
        }
    }

    /// The underlying error, if the lookup failed rather than came back empty.
    pub fn error(&self) -> Option<&Error> {
        match &self.data {
            NotFoundData::Error(err) => Some(err),
            NotFoundData::Empty(_) => None,
        }
    }
}

fn not_found_message(family: ContentFamily) -> String {
    let noun = match family {
        ContentFamily::Pages => "Page",
        ContentFamily::Images => "Image",
        ContentFamily::Documents => "Document",
    };
    format!("{} not found", noun)
}

/// Outcome of an identity lookup.
#[derive(Debug)]
pub enum LookupOutcome {
    /// The item.
    Found(ContentItem),
    /// No item; see [`NotFound`] for why.
    NotFound(NotFound),
}

impl LookupOutcome {
    /// The item, if found.
    pub fn found(&self) -> Option<&ContentItem> {
        match self {
            LookupOutcome::Found(item) => Some(item),
            LookupOutcome::NotFound(_) => None,
        }
    }

    /// Consume into the item, if found.
    pub fn into_found(self) -> Option<ContentItem> {
        match self {
            LookupOutcome::Found(item) => Some(item),
            LookupOutcome::NotFound(_) => None,
        }
    }

    /// Whether no item was produced.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupOutcome::NotFound(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Wagtail content API client.
///
/// Cheap to clone; clones share the same immutable configuration.
///
/// # Example
///
/// ```no_run
/// use wagtail_client::{QueryFilter, RequestOptions, WagtailClient};
///
/// # async fn example() -> wagtail_client::Result<()> {
/// let client = WagtailClient::builder()
///     .base_url("https://cms.example.com")
///     .build()?;
///
/// let posts = client
///     .fetch_pages(
///         Some(&QueryFilter::new().content_type("blog.BlogPage").limit(10)),
///         &RequestOptions::new(),
///     )
///     .await?;
/// println!("{} posts", posts.total_count());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WagtailClient {
    inner: Arc<ClientInner>,
}

/// Inner client state (shared across clones).
pub(crate) struct ClientInner {
    config: ClientConfig,
    default_headers: HeaderMap,
    resolver: ContentResolver,
}

impl std::fmt::Debug for WagtailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WagtailClient")
            .field("base_url", &self.inner.config.base_url)
            .field("api_path", &self.inner.config.api_path)
            .finish_non_exhaustive()
    }
}

impl WagtailClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from a configuration, using `reqwest` for transport.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Origin media URLs are resolved against.
    pub fn media_base_url(&self) -> &str {
        self.inner
            .config
            .media_base_url
            .as_deref()
            .unwrap_or(&self.inner.config.base_url)
    }

    /// Resolver used by this client.
    pub fn resolver(&self) -> &ContentResolver {
        &self.inner.resolver
    }

    // ─────────────────────────────────────────────────────────────────────────
    // API accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the pages API.
    pub fn pages(&self) -> PagesApi {
        PagesApi::new(self.clone())
    }

    /// Access the images API.
    pub fn images(&self) -> ImagesApi {
        ImagesApi::new(self.clone())
    }

    /// Access the documents API.
    pub fn documents(&self) -> DocumentsApi {
        DocumentsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch any content path: a listing for a collection, an item otherwise.
    pub async fn fetch_content(
        &self,
        path: &ContentPath,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentResponse> {
        let headers = self.headers_for(options);
        self.inner
            .resolver
            .fetch(path, filter, &headers, self.cache_for(options))
            .await
    }

    /// Look up a page by id or slug.
    ///
    /// Absence and transport failures come back as
    /// [`LookupOutcome::NotFound`]. A slug lookup with an invalid filter
    /// still fails with [`Error::Validation`].
    pub async fn fetch_page(
        &self,
        lookup: impl Into<Lookup>,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<LookupOutcome> {
        let lookup: Lookup = lookup.into();
        match lookup {
            Lookup::Id(id) => Ok(self.find_by_id(ContentFamily::Pages, id, filter, options).await),
            Lookup::Slug(slug) => {
                self.find_by_slug(ContentFamily::Pages, &slug, filter, options)
                    .await
            }
            Lookup::NegativeId(id) => {
                let err = Error::InvalidPath(format!("pages/{}", id));
                Ok(LookupOutcome::NotFound(NotFound::missing(
                    ContentFamily::Pages,
                    NotFoundData::Error(err),
                )))
            }
        }
    }

    /// Look up an image by id. Never fails; see [`LookupOutcome`].
    pub async fn fetch_image(
        &self,
        id: u64,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> LookupOutcome {
        self.find_by_id(ContentFamily::Images, id, filter, options)
            .await
    }

    /// Look up a document by id. Never fails; see [`LookupOutcome`].
    pub async fn fetch_document(
        &self,
        id: u64,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> LookupOutcome {
        self.find_by_id(ContentFamily::Documents, id, filter, options)
            .await
    }

    /// List pages. An empty listing is a success.
    pub async fn fetch_pages(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.list(ContentFamily::Pages, filter, options).await
    }

    /// List images. An empty listing is a success.
    pub async fn fetch_images(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.list(ContentFamily::Images, filter, options).await
    }

    /// List documents. An empty listing is a success.
    pub async fn fetch_documents(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.list(ContentFamily::Documents, filter, options).await
    }

    /// Display URL of an image or document item.
    ///
    /// `None` for pages, for unrecognized media types, and for items without
    /// a download URL.
    pub fn media_src(&self, item: &ContentItem) -> Option<String> {
        resolve_media_src(self.media_base_url(), item.media_meta()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn headers_for(&self, options: &RequestOptions) -> HeaderMap {
        let mut headers = self.inner.default_headers.clone();
        for name in options.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &options.headers {
            headers.append(name.clone(), value.clone());
        }
        headers
    }

    fn cache_for(&self, options: &RequestOptions) -> CachePolicy {
        options.cache.unwrap_or(self.inner.config.cache_policy)
    }

    async fn list(
        &self,
        family: ContentFamily,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        let headers = self.headers_for(options);
        self.inner
            .resolver
            .fetch_list(family, filter, &headers, self.cache_for(options))
            .await
    }

    async fn find_by_id(
        &self,
        family: ContentFamily,
        id: u64,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> LookupOutcome {
        let headers = self.headers_for(options);
        let result = self
            .inner
            .resolver
            .fetch_item(family, id, filter, &headers, self.cache_for(options))
            .await;

        match result {
            Ok(item) => LookupOutcome::Found(item),
            Err(err @ Error::Transport(_)) => {
                tracing::debug!(%family, id, error = %err, "Lookup by id failed");
                LookupOutcome::NotFound(NotFound::missing(family, NotFoundData::Error(err)))
            }
            Err(err) => {
                tracing::debug!(%family, id, error = %err, "Lookup by id failed unexpectedly");
                LookupOutcome::NotFound(NotFound::unknown(err))
            }
        }
    }

    async fn find_by_slug(
        &self,
        family: ContentFamily,
        slug: &str,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<LookupOutcome> {
        let mut query = QueryFilter::new().slug(slug);
        if let Some(filter) = filter {
            query = query.merge(filter);
        }

        match self.list(family, Some(&query), options).await {
            Ok(mut list) => {
                if list.is_empty() {
                    tracing::debug!(%family, slug, "Lookup by slug matched nothing");
                    return Ok(LookupOutcome::NotFound(NotFound::missing(
                        family,
                        NotFoundData::Empty(list),
                    )));
                }
                Ok(LookupOutcome::Found(list.items.swap_remove(0)))
            }
            Err(err @ Error::Transport(_)) => {
                tracing::debug!(%family, slug, error = %err, "Lookup by slug failed");
                Ok(LookupOutcome::NotFound(NotFound::missing(
                    family,
                    NotFoundData::Error(err),
                )))
            }
            Err(err) => Err(err),
        }
    }
}

/// Resolve the display URL of a media item against `base`.
///
/// Image download URLs are relative and are appended to `base`. Document
/// download URLs are absolute; only their path is kept and the original
/// host is discarded. Other types resolve to `None`.
pub fn resolve_media_src(base: &str, meta: &MediaMeta) -> Option<String> {
    let download = meta.download_url.as_deref()?;
    match meta.media_type.as_str() {
        IMAGE_TYPE => Some(format!("{}{}", base, download)),
        DOCUMENT_TYPE => Some(format!("{}{}", base, url_path(download))),
        _ => None,
    }
}

fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative: drop a protocol-relative host, then any query or fragment.
        Err(_) => {
            let path = match url.strip_prefix("//") {
                Some(rest) => rest.find('/').map_or("", |at| &rest[at..]),
                None => url,
            };
            path.split(|c: char| c == '?' || c == '#')
                .next()
                .unwrap_or_default()
                .to_string()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a [`WagtailClient`].
pub struct ClientBuilder {
    base_url: Option<String>,
    api_path: String,
    media_base_url: Option<String>,
    headers: BTreeMap<String, String>,
    cache_policy: CachePolicy,
    backend: Option<Arc<dyn HttpBackend>>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("api_path", &self.api_path)
            .field("media_base_url", &self.media_base_url)
            .field("cache_policy", &self.cache_policy)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            base_url: None,
            api_path: default_api_path(),
            media_base_url: None,
            headers: BTreeMap::new(),
            cache_policy: CachePolicy::default(),
            backend: None,
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Start from a configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: Some(config.base_url),
            api_path: config.api_path,
            media_base_url: config.media_base_url,
            headers: config.headers,
            cache_policy: config.cache_policy,
            ..Self::new()
        }
    }

    /// Set the site origin.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API mount point.
    pub fn api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = path.into();
        self
    }

    /// Set a separate origin for media files.
    pub fn media_base_url(mut self, url: impl Into<String>) -> Self {
        self.media_base_url = Some(url.into());
        self
    }

    /// Add a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the default cache policy.
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Use a custom HTTP backend instead of `reqwest`.
    pub fn backend(mut self, backend: Arc<dyn HttpBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Report request failures to a custom sink instead of `tracing`.
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<WagtailClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        let config = ClientConfig {
            base_url,
            api_path: self.api_path,
            media_base_url: self.media_base_url,
            headers: self.headers,
            cache_policy: self.cache_policy,
        };
        config.validate()?;
        let default_headers = header_map(&config.headers)?;

        let backend: Arc<dyn HttpBackend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(ReqwestBackend::new()?),
        };
        let transport = Transport::new(backend, self.diagnostics);
        let resolver = ContentResolver::new(&config.base_url, &config.api_path, transport);

        Ok(WagtailClient {
            inner: Arc::new(ClientInner {
                config,
                default_headers,
                resolver,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
