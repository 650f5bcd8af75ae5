use std::sync::Arc;
use std::time::Duration;

use forum_engine::{
    cache_file_name, CacheMode, CachingFetcher, FailureKind, FetchSettings, PageFetcher,
    ReqwestPageFetcher,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetcher_decodes_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>caf\xe9</p>".to_vec(), "text/html; charset=ISO-8859-1"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::default();
    let url = format!("{}/latin", server.uri());

    let page = fetcher.fetch(&url, CacheMode::Bypass).await.expect("fetch ok");
    assert_eq!(page.html, "<p>café</p>");
    assert_eq!(page.final_url, url);
    assert!(!page.from_cache);
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::default();
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch(&url, CacheMode::Refresh).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn fetcher_rejects_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4], "image/png"))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::default();
    let err = fetcher
        .fetch(&format!("{}/image", server.uri()), CacheMode::Refresh)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "image/png".to_string()
        }
    );
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>late</p>", "text/html")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::new(FetchSettings {
        request_timeout: Duration::from_millis(100),
        ..FetchSettings::default()
    });

    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()), CacheMode::Refresh)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn existence_probe_needs_plain_ok() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/here"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/moved"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/here"))
        .mount(&server)
        .await;

    let fetcher = ReqwestPageFetcher::default();

    assert!(fetcher.exists(&format!("{}/here", server.uri())).await.unwrap());
    assert!(!fetcher.exists(&format!("{}/moved", server.uri())).await.unwrap());
    assert!(!fetcher.exists(&format!("{}/gone", server.uri())).await.unwrap());
}

#[tokio::test]
async fn invalid_url_is_reported() {
    let fetcher = ReqwestPageFetcher::default();
    let err = fetcher.exists("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

async fn counting_server(body: &str, expected: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .expect(expected)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn reuse_reads_stored_copy_without_network() {
    let server = counting_server("<p>stored</p>", 1).await;
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CachingFetcher::new(Arc::new(ReqwestPageFetcher::default()), dir.path().into());
    let url = format!("{}/page", server.uri());

    let first = fetcher.fetch(&url, CacheMode::Reuse).await.unwrap();
    let second = fetcher.fetch(&url, CacheMode::Reuse).await.unwrap();

    assert!(!first.from_cache);
    assert!(second.from_cache);
    assert_eq!(second.html, "<p>stored</p>");
    assert!(dir.path().join(cache_file_name(&url)).is_file());
}

#[tokio::test]
async fn refresh_always_downloads_and_overwrites() {
    let server = counting_server("<p>fresh</p>", 2).await;
    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/page", server.uri());
    std::fs::write(dir.path().join(cache_file_name(&url)), "<p>stale</p>").unwrap();
    let fetcher = CachingFetcher::new(Arc::new(ReqwestPageFetcher::default()), dir.path().into());

    let first = fetcher.fetch(&url, CacheMode::Refresh).await.unwrap();
    fetcher.fetch(&url, CacheMode::Refresh).await.unwrap();

    assert_eq!(first.html, "<p>fresh</p>");
    let stored = std::fs::read_to_string(dir.path().join(cache_file_name(&url))).unwrap();
    assert_eq!(stored, "<p>fresh</p>");
}

#[tokio::test]
async fn bypass_leaves_cache_untouched() {
    let server = counting_server("<p>direct</p>", 1).await;
    let dir = tempfile::tempdir().unwrap();
    let fetcher = CachingFetcher::new(Arc::new(ReqwestPageFetcher::default()), dir.path().into());
    let url = format!("{}/page", server.uri());

    fetcher.fetch(&url, CacheMode::Bypass).await.unwrap();

    assert!(!dir.path().join(cache_file_name(&url)).exists());
}
