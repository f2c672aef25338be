//! Integration tests for the client over real HTTP.
//!
//! These tests run the `reqwest` backend against a local wiremock server.

use std::sync::{Arc, Mutex};

use serde_json::json;
use wagtail_client::{
    CachePolicy, ContentFamily, DiagnosticSink, ErrorCode, FailureRecord, LookupOutcome,
    NotFoundData, QueryFilter, RequestOptions, WagtailClient,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<FailureRecord>>,
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, record: &FailureRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

fn client(server: &MockServer) -> WagtailClient {
    WagtailClient::builder()
        .base_url(server.uri())
        .build()
        .expect("Failed to build client")
}

fn page(id: u64, slug: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": slug.to_uppercase(),
        "meta": {
            "type": "home.HomePage",
            "slug": slug,
            "locale": "en",
            "detail_url": format!("http://localhost/api/v2/pages/{}/", id),
            "html_url": format!("http://localhost/{}/", slug)
        },
        "intro": "Hello"
    })
}

#[tokio::test]
async fn test_page_lookup_by_slug() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pages/"))
        .and(query_param("slug", "about"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "total_count": 1 },
            "items": [page(4, "about")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).pages().find("about").await.unwrap();

    let page = outcome.into_found().expect("page should be found");
    assert_eq!(page.id, 4);
    assert_eq!(page.family, ContentFamily::Pages);
    assert_eq!(page.page_meta().unwrap().slug, "about");
    assert_eq!(page.field("intro"), Some(&json!("Hello")));
}

#[tokio::test]
async fn test_page_lookup_by_slug_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "total_count": 0 },
            "items": []
        })))
        .mount(&server)
        .await;

    let outcome = client(&server).pages().find("nope").await.unwrap();

    match outcome {
        LookupOutcome::NotFound(not_found) => {
            assert!(matches!(not_found.data, NotFoundData::Empty(ref list) if list.is_empty()));
        }
        LookupOutcome::Found(_) => panic!("expected not found"),
    }
}

#[tokio::test]
async fn test_list_sends_filter_and_default_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pages/"))
        .and(query_param("type", "blog.BlogPage"))
        .and(query_param("fields", "intro,date"))
        .and(query_param("limit", "2"))
        .and(header("x-site", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "total_count": 5 },
            "items": [page(1, "one"), page(2, "two")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WagtailClient::builder()
        .base_url(server.uri())
        .header("x-site", "main")
        .build()
        .unwrap();

    let filter = QueryFilter::new()
        .content_type("blog.BlogPage")
        .fields(["intro", "date"])
        .limit(2);
    let list = client
        .fetch_pages(Some(&filter), &RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(list.total_count(), 5);
    assert_eq!(list.items.len(), 2);

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("cache-control").is_none());
}

#[tokio::test]
async fn test_cache_override_reaches_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/images/"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "total_count": 0 },
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::new().cache(CachePolicy::NoStore);
    let list = client(&server)
        .images()
        .list_with_options(None, &options)
        .await
        .unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_missing_page_by_id_is_not_found_and_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/pages/42/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Page not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(RecordingSink::default());
    let client = WagtailClient::builder()
        .base_url(server.uri())
        .diagnostics(sink.clone())
        .build()
        .unwrap();

    let outcome = client
        .fetch_page(42u64, None, &RequestOptions::new())
        .await
        .unwrap();

    let LookupOutcome::NotFound(not_found) = outcome else {
        panic!("expected not found");
    };
    let err = not_found.error().unwrap();
    assert_eq!(err.transport_code(), Some(ErrorCode::RequestFailed));

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, ErrorCode::RequestFailed);
    assert_eq!(records[0].url, format!("{}/api/v2/pages/42/?", server.uri()));
}

#[tokio::test]
async fn test_invalid_filters_send_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client
        .fetch_pages(
            Some(&QueryFilter::new().order("random").offset(10)),
            &RequestOptions::new(),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let err = client
        .fetch_documents(
            Some(&QueryFilter::new().descendant_of(1)),
            &RequestOptions::new(),
        )
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_non_json_body_is_unexpected_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .documents()
        .list(None)
        .await
        .unwrap_err();
    assert_eq!(err.transport_code(), Some(ErrorCode::UnexpectedError));
}

#[tokio::test]
async fn test_unreachable_server_is_unexpected_error() {
    let client = WagtailClient::builder()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();

    let err = client
        .fetch_images(None, &RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.transport_code(), Some(ErrorCode::UnexpectedError));
}

#[tokio::test]
async fn test_document_src_rebased_onto_media_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/documents/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "title": "Annual report",
            "meta": {
                "type": "wagtaildocs.Document",
                "detail_url": "http://internal/api/v2/documents/8/",
                "download_url": "http://internal/documents/8/report.pdf",
                "tags": ["finance"]
            }
        })))
        .mount(&server)
        .await;

    let client = WagtailClient::builder()
        .base_url(server.uri())
        .media_base_url("https://media.example.com")
        .build()
        .unwrap();

    let document = client.documents().find(8).await.into_found().unwrap();
    assert_eq!(
        client.documents().src(&document).as_deref(),
        Some("https://media.example.com/documents/8/report.pdf")
    );
}
