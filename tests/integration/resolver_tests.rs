//! Integration tests for redirect resolution
//!
//! These tests use wiremock to stand in for the sites being resolved.

use ref_cli::config::ResolverConfig;
use ref_cli::fetch::RedirectResolver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Resolver config with short timeouts and a 1ms backoff
fn test_config() -> ResolverConfig {
    ResolverConfig {
        timeout_secs: 5,
        max_retries: 3,
        backoff_ms: 1,
        rate_limited_domains: vec![],
        ..Default::default()
    }
}

fn resolver(config: &ResolverConfig) -> RedirectResolver {
    RedirectResolver::new(config).expect("Failed to build resolver")
}

#[tokio::test]
async fn test_follows_redirect_to_final_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/article", base_url)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Article</title>"))
        .mount(&mock_server)
        .await;

    let resolved = resolver(&test_config())
        .resolve(&format!("{}/short", base_url))
        .await;
    assert_eq!(resolved, format!("{}/article", base_url));
}

#[tokio::test]
async fn test_youtube_wrapper_is_unwrapped_without_request() {
    let resolved = resolver(&test_config())
        .resolve("https://www.youtube.com/redirect?event=video_description&q=https%3A%2F%2Fexample.com%2Fpaper")
        .await;
    assert_eq!(resolved, "https://example.com/paper");
}

#[tokio::test]
async fn test_rate_limited_response_keeps_original() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/limited", mock_server.uri());
    assert_eq!(resolver(&test_config()).resolve(&url).await, url);
}

#[tokio::test]
async fn test_login_redirect_keeps_original() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/private/doc"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/accounts/login?next=/private/doc", base_url)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form></form>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/private/doc", base_url);
    assert_eq!(resolver(&test_config()).resolve(&url).await, url);
}

#[tokio::test]
async fn test_homepage_trap_keeps_original() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/en-us/news/story"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", format!("{}/", base_url)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("home"))
        .mount(&mock_server)
        .await;

    let config = ResolverConfig {
        homepage_traps: vec![format!("{}/", base_url)],
        ..test_config()
    };
    let resolver = resolver(&config);

    let url = format!("{}/en-us/news/story", base_url);
    assert_eq!(resolver.resolve(&url).await, url);

    // Recording the homepage itself is still allowed
    let home = format!("{}/", base_url);
    assert_eq!(resolver.resolve(&home).await, home);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/flaky", mock_server.uri());
    assert_eq!(resolver(&test_config()).resolve(&url).await, url);
}

#[tokio::test]
async fn test_exhausted_retries_keep_original() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ResolverConfig {
        max_retries: 2,
        ..test_config()
    };
    let url = format!("{}/down", mock_server.uri());
    assert_eq!(resolver(&config).resolve(&url).await, url);
}

#[tokio::test]
async fn test_connection_error_keeps_original() {
    let url = "http://127.0.0.1:1/unreachable";
    assert_eq!(resolver(&test_config()).resolve(url).await, url);
}
