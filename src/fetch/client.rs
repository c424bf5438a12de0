//! HTTP client construction
//!
//! Redirect resolution fetches arbitrary pages on the user's behalf, so the
//! client looks like a browser: browser user agent and accept headers,
//! redirects followed automatically, and relaxed TLS verification for the
//! many small sites with broken certificate chains.

use crate::config::ResolverConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum number of redirect hops followed before giving up
pub const MAX_REDIRECTS: usize = 10;

/// Builds the HTTP client used for redirect resolution
///
/// # Arguments
///
/// * `config` - Resolver configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use ref_cli::config::ResolverConfig;
/// use ref_cli::fetch::build_http_client;
///
/// let client = build_http_client(&ResolverConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ResolverConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Builds the client used for JSON API calls (no relaxed TLS)
pub fn build_api_client(timeout_secs: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("ref-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .gzip(true)
        .build()
}
