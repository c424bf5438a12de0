//! Redirect resolution
//!
//! Turns shortened, wrapped or redirecting links into the URL the user
//! actually meant to record. Resolution never fails: every error path falls
//! back to the input URL.

use crate::config::ResolverConfig;
use crate::fetch::client::build_http_client;
use crate::url::{domain_of, matches_any, matches_wildcard};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Maps a URL to the URL that should be recorded
#[async_trait]
pub trait UrlResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> String;
}

/// Follows redirects to a URL's final destination
pub struct RedirectResolver {
    client: Client,
    config: ResolverConfig,
}

impl RedirectResolver {
    /// Creates a resolver with a browser-like client built from the config
    pub fn new(config: &ResolverConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, config))
    }

    /// Creates a resolver around an existing client
    pub fn with_client(client: Client, config: &ResolverConfig) -> Self {
        Self {
            client,
            config: config.clone(),
        }
    }

    /// Resolves the final URL after following any redirects
    ///
    /// # Resolution Order
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | YouTube redirect wrapper with `q` | `q` target, no request |
    /// | Host is rate-limit sensitive | input |
    /// | HTTP 5xx | retried with exponential backoff, then input |
    /// | HTTP 429 | input |
    /// | Final URL is a login page | input |
    /// | Final URL is a homepage trap | input |
    /// | Network error | input (logged) |
    /// | Anything else | final URL |
    pub async fn resolve(&self, url: &str) -> String {
        let url = url.trim();

        if let Some(target) = unwrap_youtube_redirect(url) {
            tracing::debug!("Unwrapped YouTube redirect to {}", target);
            return target;
        }

        if let Some(host) = domain_of(url) {
            if matches_any(&self.config.rate_limited_domains, &host) {
                tracing::debug!("Skipping redirect resolution for rate-limited host {}", host);
                return url.to_string();
            }
        }

        let mut attempt: u32 = 0;
        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() {
                        if attempt < self.config.max_retries {
                            let delay = self.backoff(attempt);
                            tracing::debug!(
                                "HTTP {} from {}, retrying in {:?}",
                                status.as_u16(),
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            continue;
                        }
                        tracing::warn!(
                            "Giving up resolving {} after {} retries (HTTP {})",
                            url,
                            attempt,
                            status.as_u16()
                        );
                        return url.to_string();
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        tracing::warn!("Rate limited while resolving {}, keeping original", url);
                        return url.to_string();
                    }

                    return self.screen_final(url, response.url().as_str());
                }
                Err(e) => {
                    if e.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
                        tracing::warn!("Rate limited while resolving {}, keeping original", url);
                    } else if e.is_redirect() {
                        tracing::warn!("Too many redirects resolving {}: {}", url, e);
                    } else if e.is_timeout() {
                        tracing::warn!("Timed out resolving {}", url);
                    } else {
                        tracing::warn!("Error resolving redirect for URL: {}, error: {}", url, e);
                    }
                    return url.to_string();
                }
            }
        }
    }

    /// Rejects final URLs that mean the redirect went somewhere useless
    fn screen_final(&self, original: &str, final_url: &str) -> String {
        if is_auth_url(final_url) {
            tracing::debug!(
                "Redirect from {} ended on a login page ({}), keeping original",
                original,
                final_url
            );
            return original.to_string();
        }

        let is_trap = |candidate: &str| {
            self.config
                .homepage_traps
                .iter()
                .any(|trap| trap.trim() == candidate)
        };
        if is_trap(final_url) && !is_trap(original) {
            tracing::debug!(
                "Prevented incorrect redirect to homepage, keeping original URL: {}",
                original
            );
            return original.to_string();
        }

        final_url.to_string()
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.config
                .backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt)),
        )
    }
}

#[async_trait]
impl UrlResolver for RedirectResolver {
    async fn resolve(&self, url: &str) -> String {
        RedirectResolver::resolve(self, url).await
    }
}

/// Returns the `q` target of a `youtube.com/redirect` wrapper link
///
/// # Examples
///
/// ```
/// use ref_cli::fetch::unwrap_youtube_redirect;
///
/// assert_eq!(
///     unwrap_youtube_redirect("https://www.youtube.com/redirect?event=x&q=https%3A%2F%2Fexample.com%2F"),
///     Some("https://example.com/".to_string())
/// );
/// assert_eq!(unwrap_youtube_redirect("https://www.youtube.com/watch?v=abc"), None);
/// ```
pub fn unwrap_youtube_redirect(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if !matches_wildcard("*.youtube.com", &host) || parsed.path() != "/redirect" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.into_owned())
        .filter(|target| !target.is_empty())
}

/// Returns true if the URL path looks like a login or SSO page
pub fn is_auth_url(url: &str) -> bool {
    static AUTH: OnceLock<Regex> = OnceLock::new();
    let re = AUTH.get_or_init(|| {
        Regex::new(
            r"(?i)/(accounts/login|login|log-in|signin|sign-in|sign_in|auth|authenticate|oauth2?|sso)(/|$|\.)",
        )
        .expect("valid auth path regex")
    });
    match Url::parse(url) {
        Ok(parsed) => re.is_match(parsed.path()),
        Err(_) => false,
    }
}
