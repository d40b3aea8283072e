//! Integration tests for the resolution chain and media fetcher using wiremock.
//!
//! Every endpoint template is pointed at a local mock server, so no test touches the network.

use douyin_fetch::config::Config;
use douyin_fetch::{FetchError, MediaFetcher, ResolveError, VideoResolver};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PATH: &str = "/web/api/v2/aweme/iteminfo/";

fn config_for(server: &MockServer) -> Config {
    let base = server.uri();
    let mut config = Config::default();
    config.endpoints.mobile_api = format!("{}{}?item_ids={{id}}", base, API_PATH);
    config.endpoints.mobile_page = format!("{}/share/video/{{id}}", base);
    config.endpoints.desktop_page = format!("{}/video/{{id}}", base);
    config.http.redirect_timeout_secs = 2;
    config
}

fn api_success(play_url: &str, desc: &str) -> serde_json::Value {
    json!({
        "status_code": 0,
        "item_list": [{
            "desc": desc,
            "author": {"nickname": "测试作者"},
            "video": {
                "play_addr": {"uri": "v0200fg10000", "url_list": [play_url]}
            }
        }]
    })
}

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mobile API answers with a watermarked URL; the download uses the rewritten one.
#[tokio::test]
async fn test_api_resolution_rewrites_watermark_and_downloads() {
    let server = MockServer::start().await;
    let config = config_for(&server);
    let video_bytes = vec![7u8; 20_000];

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("item_ids", "12345678901234"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(api_success(&format!("{}/media/playwm/video.mp4", server.uri()), "测试视频")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/media/play/video.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(video_bytes.clone()))
        .expect(1)
        .mount(&server)
        .await;

    // Later strategies must never run once the API resolved
    mount_page(&server, "/share/video/12345678901234", 200, "", 0).await;
    mount_page(&server, "/video/12345678901234", 200, "", 0).await;

    let dir = tempfile::tempdir().unwrap();
    let report = VideoResolver::new(&config)
        .quiet(true)
        .resolve_and_download("https://www.douyin-mirror.example/video/12345678901234", dir.path(), None)
        .await
        .expect("resolution should succeed");

    let resolution = &report.resolution;
    assert_eq!(resolution.video_id.as_str(), "12345678901234");
    assert_eq!(resolution.strategy, "mobile-api");
    assert_eq!(
        resolution.candidate.media_url,
        format!("{}/media/play/video.mp4", server.uri())
    );
    assert!(resolution.candidate.watermarked);
    assert_eq!(resolution.title(), "测试视频");
    assert_eq!(resolution.author(), "测试作者");

    let expected_path = dir.path().join("测试视频_12345678901234.mp4");
    assert_eq!(report.outcome.path, expected_path);
    assert_eq!(report.outcome.bytes_written, video_bytes.len() as u64);
    assert_eq!(report.outcome.total_expected, Some(video_bytes.len() as u64));
    assert_eq!(report.outcome.progress(), Some(1.0));
    assert_eq!(std::fs::read(&expected_path).unwrap(), video_bytes);
}

/// API failure falls through to the mobile page scrape; the desktop page is never fetched.
#[tokio::test]
async fn test_mobile_page_fallback_with_title() {
    let server = MockServer::start().await;
    let config = config_for(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let page = r#"<html><head><title>Real Video Title</title></head>
        <script>var data = {"playAddr":"https://cdn.example.com/x.mp4"};</script></html>"#;
    mount_page(&server, "/share/video/12345678901234", 200, page, 1).await;
    mount_page(&server, "/video/12345678901234", 200, "", 0).await;

    let resolution = VideoResolver::new(&config)
        .resolve("https://www.douyin-mirror.example/video/12345678901234")
        .await
        .expect("mobile page should resolve");

    assert_eq!(resolution.strategy, "mobile-page");
    assert_eq!(resolution.candidate.media_url, "https://cdn.example.com/x.mp4");
    assert_eq!(resolution.title(), "Real Video Title");
    assert_eq!(resolution.author(), "unknown");
}

/// A stalled API call counts against that strategy only; the page scrape still resolves.
#[tokio::test]
async fn test_api_timeout_falls_through_to_mobile_page() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.http.api_timeout_secs = 1;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(api_success("https://v26.douyinvod.com/late.mp4", "late"))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let page = r#"<title>On Time</title><script>{"playAddr":"https://cdn.example.com/on-time.mp4"}</script>"#;
    mount_page(&server, "/share/video/7301234567890123456", 200, page, 1).await;
    mount_page(&server, "/video/7301234567890123456", 200, "", 0).await;

    let resolution = VideoResolver::new(&config)
        .resolve("https://www.douyin.com/video/7301234567890123456")
        .await
        .expect("mobile page should resolve after the API times out");

    assert_eq!(resolution.strategy, "mobile-page");
    assert_eq!(resolution.candidate.media_url, "https://cdn.example.com/on-time.mp4");
    assert_eq!(resolution.title(), "On Time");
}

/// Only the desktop page carries the data, inside its hydration blob.
#[tokio::test]
async fn test_desktop_page_embedded_json() {
    let server = MockServer::start().await;
    let config = config_for(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;
    mount_page(&server, "/share/video/7301234567890123456", 404, "", 1).await;

    let page = r#"<html><script id="RENDER_DATA" type="application/json">{"app":{"videoDetail":{"video":{"play_addr":{"url_list":["https://v3-web.douyinvod.com/x/playwm/"]}}}}}</script></html>"#;
    mount_page(&server, "/video/7301234567890123456", 200, page, 1).await;

    let resolution = VideoResolver::new(&config)
        .resolve("7301234567890123456")
        .await
        .expect("desktop page should resolve");

    assert_eq!(resolution.strategy, "desktop-page");
    assert_eq!(resolution.candidate.media_url, "https://v3-web.douyinvod.com/x/play/");
    assert_eq!(resolution.title(), "douyin_7301234567890123456");
}

/// Every strategy misses: NotFound, and nothing is written.
#[tokio::test]
async fn test_exhausted_chain_reports_not_found() {
    let server = MockServer::start().await;
    let config = config_for(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status_code": 2053, "item_list": null})))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/share/video/12345678901234", 200, "<html><title>抖音</title></html>", 1).await;
    mount_page(&server, "/video/12345678901234", 404, "", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("downloads");

    let result = VideoResolver::new(&config)
        .quiet(true)
        .resolve_and_download("https://www.douyin-mirror.example/video/12345678901234", &output_dir, None)
        .await;

    match result {
        Err(ResolveError::NotFound(id)) => assert_eq!(id.as_str(), "12345678901234"),
        other => panic!("expected NotFound, got {:?}", other.map(|r| r.outcome.path)),
    }
    assert!(!output_dir.exists());
}

/// Short links are followed and the identifier is read from where they land.
#[tokio::test]
async fn test_short_link_is_followed() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.http.short_link_hosts = vec!["127.0.0.1".to_string()];

    Mock::given(method("GET"))
        .and(path("/AbCdEf/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/share/landing/video/7301234567890123456/?region=CN"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/share/landing/video/7301234567890123456/", 200, "ok", 1).await;

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("item_ids", "7301234567890123456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_success("https://v26.douyinvod.com/a.mp4", "")))
        .expect(1)
        .mount(&server)
        .await;

    let share_text = format!("3.14 复制打开抖音，看看【作品】 {}/AbCdEf/ 复制此链接", server.uri());
    let resolution = VideoResolver::new(&config)
        .resolve(&share_text)
        .await
        .expect("short link should resolve");

    assert_eq!(resolution.share_link, format!("{}/AbCdEf/", server.uri()));
    assert!(resolution.resolved_link.contains("/share/landing/video/7301234567890123456/"));
    assert_eq!(resolution.video_id.as_str(), "7301234567890123456");
    assert_eq!(resolution.title(), "douyin_7301234567890123456");
}

/// A short link that cannot be fetched is used as-is instead of aborting.
#[tokio::test]
async fn test_unreachable_short_link_degrades_to_original() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.http.short_link_hosts = vec!["unreachable.invalid".to_string()];

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(api_success("https://v26.douyinvod.com/a.mp4", "x")))
        .expect(1)
        .mount(&server)
        .await;

    let link = "http://unreachable.invalid/video/7301234567890123456";
    let resolution = VideoResolver::new(&config)
        .resolve(link)
        .await
        .expect("identifier should come from the original link");

    assert_eq!(resolution.resolved_link, link);
    assert_eq!(resolution.video_id.as_str(), "7301234567890123456");
}

#[tokio::test]
async fn test_link_without_identifier() {
    let config = Config::default();
    let result = VideoResolver::new(&config)
        .resolve("https://www.douyin.com/user/MS4wLjABAAAA")
        .await;

    assert!(matches!(result, Err(ResolveError::IdentifierNotFound(_))));
}

#[tokio::test]
async fn test_invalid_input() {
    let config = Config::default();
    let result = VideoResolver::new(&config).resolve("   ").await;

    assert!(matches!(result, Err(ResolveError::InvalidShareLink(_))));
}

/// A rejected media request fails before any file is created.
#[tokio::test]
async fn test_download_http_error() {
    let server = MockServer::start().await;
    let config = config_for(&server);

    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(api_success(&format!("{}/media/gone.mp4", server.uri()), "gone")),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/media/gone.mp4", 403, "", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let result = VideoResolver::new(&config)
        .quiet(true)
        .resolve_and_download("https://www.douyin.com/video/7301234567890123456", dir.path(), Some("custom"))
        .await;

    match result {
        Err(ResolveError::Fetch(FetchError::Status(status))) => assert_eq!(status.as_u16(), 403),
        other => panic!("expected a fetch error, got {:?}", other.map(|r| r.outcome.path)),
    }
    assert!(!dir.path().join("custom.mp4").exists());
}

#[tokio::test]
async fn test_fetcher_streams_to_custom_path() {
    let server = MockServer::start().await;
    let config = Config::default();
    let body: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("clip.mp4");
    let outcome = MediaFetcher::new(reqwest::Client::new(), &config)
        .quiet(true)
        .fetch(&format!("{}/clip.mp4", server.uri()), &target)
        .await
        .unwrap();

    assert_eq!(outcome.bytes_written, body.len() as u64);
    assert_eq!(std::fs::read(&target).unwrap(), body);
}

#[tokio::test]
async fn test_fetcher_times_out_waiting_for_headers() {
    let server = MockServer::start().await;
    let mut config = Config::default();
    config.http.download_idle_timeout_secs = 1;

    Mock::given(method("GET"))
        .and(path("/stalled.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1u8; 1024])
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("stalled.mp4");
    let started = std::time::Instant::now();

    let result = MediaFetcher::new(reqwest::Client::new(), &config)
        .quiet(true)
        .fetch(&format!("{}/stalled.mp4", server.uri()), &target)
        .await;

    assert!(matches!(result, Err(FetchError::Timeout(d)) if d == Duration::from_secs(1)));
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(!target.exists());
}
