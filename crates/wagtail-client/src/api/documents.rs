//! Documents API.

use crate::client::{LookupOutcome, RequestOptions, WagtailClient};
use crate::error::Result;
use crate::query::QueryFilter;
use crate::types::{ContentItem, ContentList};

/// Documents API client.
///
/// Documents are looked up by id only.
pub struct DocumentsApi {
    client: WagtailClient,
}

impl DocumentsApi {
    pub(crate) fn new(client: WagtailClient) -> Self {
        Self { client }
    }

    /// List documents.
    pub async fn list(&self, filter: Option<&QueryFilter>) -> Result<ContentList> {
        self.client
            .fetch_documents(filter, &RequestOptions::new())
            .await
    }

    /// List documents with per-call headers or cache policy.
    pub async fn list_with_options(
        &self,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> Result<ContentList> {
        self.client.fetch_documents(filter, options).await
    }

    /// Look up a document by id.
    pub async fn find(&self, id: u64) -> LookupOutcome {
        self.client
            .fetch_document(id, None, &RequestOptions::new())
            .await
    }

    /// Look up a document with an extra filter and per-call options.
    pub async fn find_with_options(
        &self,
        id: u64,
        filter: Option<&QueryFilter>,
        options: &RequestOptions,
    ) -> LookupOutcome {
        self.client.fetch_document(id, filter, options).await
    }

    /// Display URL of a document, rebased onto the configured media origin.
    pub fn src(&self, document: &ContentItem) -> Option<String> {
        self.client.media_src(document)
    }
}
