//! Resource fetcher against local files and a mock HTTP server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swolegen_core::fetch::{FetchError, ResourceFetcher};
use swolegen_test_utils::temp_document;

#[tokio::test]
async fn http_body_is_capped_exactly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 200_000]))
        .mount(&server)
        .await;

    let text = ResourceFetcher::new()
        .fetch(&format!("{}/history.csv", server.uri()), 1024)
        .await
        .unwrap();
    assert_eq!(text.len(), 1024);
}

#[tokio::test]
async fn non_utf8_http_body_stays_within_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history-latin1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF; 200_000]))
        .mount(&server)
        .await;

    let text = ResourceFetcher::new()
        .fetch(&format!("{}/history-latin1.csv", server.uri()), 1024)
        .await
        .unwrap();
    assert!(text.len() <= 1024, "got {} bytes", text.len());
    assert!(text.chars().all(|c| c == char::REPLACEMENT_CHARACTER));
}

#[tokio::test]
async fn short_http_body_is_returned_whole() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Prefer rows."))
        .mount(&server)
        .await;

    let text = ResourceFetcher::new().fetch(&server.uri(), 65536).await.unwrap();
    assert_eq!(text, "Prefer rows.");
}

#[tokio::test]
async fn redirect_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let err = ResourceFetcher::new()
        .fetch(&format!("{}/rules.md", server.uri()), 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 304, .. }));
}

#[tokio::test]
async fn not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = ResourceFetcher::new().fetch(&server.uri(), 1024).await.unwrap_err();
    assert!(err.to_string().contains("status 404"));
}

#[tokio::test]
async fn file_url_and_plain_path_read_the_same_file() {
    let doc = temp_document("Bench 185x6\nRow 135x10\n");
    let fetcher = ResourceFetcher::new();

    let via_url = fetcher
        .fetch(&format!("file://{}", doc.path().display()), 4096)
        .await
        .unwrap();
    let via_path = fetcher
        .fetch(&doc.path().display().to_string(), 4096)
        .await
        .unwrap();
    assert_eq!(via_url, "Bench 185x6\nRow 135x10\n");
    assert_eq!(via_url, via_path);
}

#[tokio::test]
async fn local_file_truncation_is_silent() {
    let doc = temp_document(&"a".repeat(5000));
    let text = ResourceFetcher::new()
        .fetch(&doc.path().display().to_string(), 100)
        .await
        .unwrap();
    assert_eq!(text.len(), 100);
}
