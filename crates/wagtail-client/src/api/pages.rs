//! Pages API.

use crate::client::{Lookup, LookupOutcome, RequestOptions, WagtailClient};
use crate::error::Result;
use crate::query::QueryFilter;
use crate::types::ContentList;

/// Pages API client.
pub struct PagesApi {
    client: WagtailClient,
}

impl PagesApi {
    pub(crate) fn new(client: WagtailClient) -> Self {
        Self { client }
    }

    /// List pages.
    pub async fn list(&self, filter: Option<&QueryFilter>) -> Result<ContentList> {
        self.list_with_options(filter, &RequestOptions::new()).await
    }

    /// List pages with per-call headers or cache policy.
    pub async fn list_with_options(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.client.fetch_pages(filter, options).await
    }

    /// List pages of one model, e.g. `blog.BlogPage`.
    pub async fn list_of_type(&self, model: &str) -> Result<ContentList> {
        self.list(Some(&QueryFilter::new().content_type(model))).await
    }

    /// List the direct children of a page.
    pub async fn children_of(&self, id: u64) -> Result<ContentList> {
        self.list(Some(&QueryFilter::new().child_of(id))).await
    }

    /// Look up a page by id or slug.
    pub async fn find(&self, lookup: impl Into<Lookup>) -> Result<LookupOutcome> {
        self.find_with_options(lookup, None, &RequestOptions::new())
            .await
    }

    /// Look up a page with an extra filter and per-call options.
    pub async fn find_with_options(
        &self,
        lookup: impl Into<Lookup>,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<LookupOutcome> {
        self.client.fetch_page(lookup, filter, options).await
    }
}
