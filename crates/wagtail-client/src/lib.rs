//! Typed client for the Wagtail headless content API.
//!
//! This crate builds requests for pages, images, and documents, validates
//! filter combinations before anything is sent, and normalizes responses
//! into typed items and listings.
//!
//! # Example
//!
//! ```no_run
//! use wagtail_client::{LookupOutcome, QueryFilter, RequestOptions, WagtailClient};
//!
//! # async fn example() -> wagtail_client::Result<()> {
//! let client = WagtailClient::builder()
//!     .base_url("https://cms.example.com")
//!     .media_base_url("https://media.example.com")
//!     .build()?;
//!
//! // Look up a page by slug
//! match client.pages().find("about").await? {
//!     LookupOutcome::Found(page) => println!("{}", page.title),
//!     LookupOutcome::NotFound(not_found) => println!("{}", not_found.message),
//! }
//!
//! // List the children of the home page
//! let children = client
//!     .fetch_pages(Some(&QueryFilter::new().child_of(3)), &RequestOptions::new())
//!     .await?;
//! for page in &children.items {
//!     println!("{}", page.title);
//! }
//!
//! // Resolve an image URL
//! if let Some(image) = client.images().find(7).await.into_found() {
//!     println!("{:?}", client.media_src(&image));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failure model
//!
//! - Configuration problems fail [`ClientBuilder::build`].
//! - Invalid filter combinations fail with [`Error::Validation`] before any
//!   request is sent.
//! - Transport failures carry an [`ErrorCode`] and are reported to the
//!   configured [`DiagnosticSink`].
//! - Identity lookups turn absence and transport failures into
//!   [`LookupOutcome::NotFound`]; listings propagate every failure.

pub mod api;
pub mod client;
pub mod content;
pub mod error;
pub mod query;
pub mod transport;
pub mod types;

pub use api::{DocumentsApi, ImagesApi, PagesApi};
pub use client::{
    resolve_media_src, ClientBuilder, ClientConfig, Lookup, LookupOutcome, NotFound,
    NotFoundData, RequestOptions, WagtailClient,
};
pub use content::{ContentFamily, ContentPath, ContentResolver};
pub use error::{Error, ErrorCode, Result, TransportError, ValidationError};
pub use query::{serialize, QueryFilter, QueryValue};
pub use transport::{
    CachePolicy, DiagnosticSink, FailureRecord, HttpBackend, HttpRequest, HttpResponse,
    MockBackend, ReqwestBackend, TracingSink, Transport,
};
pub use types::*;
