//! Images API.

use crate::client::{LookupOutcome, RequestOptions, WagtailClient};
use crate::error::Result;
use crate::query::QueryFilter;
use crate::types::{ContentItem, ContentList};

/// Images API client.
///
/// Images are looked up by id only.
pub struct ImagesApi {
    client: WagtailClient,
}

impl ImagesApi {
    pub(crate) fn new(client: WagtailClient) -> Self {
        Self { client }
    }

    /// List images.
    pub async fn list(&self, filter: Option<&QueryFilter>) -> Result<ContentList> {
        self.client.fetch_images(filter, &RequestOptions::new()).await
    }

    /// List images with per-call headers or cache policy.
    pub async fn list_with_options(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.client.fetch_images(filter, options).await
    }

    /// Look up an image by id.
    pub async fn find(&self, id: u64) -> LookupOutcome {
        self.client
            .fetch_image(id, None, &RequestOptions::new())
            .await
    }

    /// Look up an image with an extra filter and per-call options.
    pub async fn find_with_options(
        &self,
        id: u64,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> LookupOutcome {
        self.client.fetch_image(id, filter, options).await
    }

    /// Display URL of an image.
    pub fn src(&self, image: &ContentItem) -> Option<String> {
        self.client.media_src(image)
    }
}
