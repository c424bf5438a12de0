use crate::config::DEFAULT_REMOVABLE_KEYS;
use url::Url;

/// Strips tracking parameters and canonicalizes URLs for deduplication
///
/// Two URLs are duplicates iff their normalized forms are equal.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Lower-cased tracking keys
    removable_keys: Vec<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_REMOVABLE_KEYS.iter().copied())
    }
}

impl Normalizer {
    /// Creates a normalizer that removes the given query keys (case-insensitive)
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            removable_keys: keys
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Normalizes a URL
    ///
    /// # Normalization Steps
    ///
    /// 1. Parse the URL; unparseable input is returned trimmed but otherwise untouched
    /// 2. Lowercase the host (scheme and path case are preserved)
    /// 3. Remove trailing slashes from the path
    /// 4. Remove the fragment
    /// 5. Remove tracking query parameters (`utm_*` and the configured keys)
    /// 6. Sort remaining query parameters by key
    /// 7. Remove an empty query string
    /// 8. Percent-encode `|`, which separates fields in the reference store
    ///
    /// # Examples
    ///
    /// ```
    /// use ref_cli::url::Normalizer;
    ///
    /// let normalizer = Normalizer::default();
    /// let url = normalizer.normalize("https://EXAMPLE.com/Page/?utm_source=x&b=2&a=1#top");
    /// assert_eq!(url, "https://example.com/Page?a=1&b=2");
    /// ```
    pub fn normalize(&self, url_str: &str) -> String {
        let trimmed = url_str.trim();
        let mut url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Leaving unparseable URL as-is ({}): {}", e, trimmed);
                return escape_pipes(trimmed);
            }
        };

        // The url crate already lower-cases hosts of special schemes; other
        // schemes keep whatever they were given.
        if let Some(host) = url.host_str().map(str::to_string) {
            let lowered = host.to_lowercase();
            if lowered != host && url.set_host(Some(&lowered)).is_err() {
                tracing::debug!("Could not lower-case host of {}", trimmed);
            }
        }

        if !url.cannot_be_a_base() {
            let path = url.path().trim_end_matches('/').to_string();
            url.set_path(&path);
        }

        url.set_fragment(None);

        if url.query().is_some() {
            let params = self.filter_and_sort_query_params(&url);
            if params.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(params);
            }
        }

        escape_pipes(url.as_str())
    }

    /// Filters out tracking parameters and sorts remaining query parameters
    fn filter_and_sort_query_params(&self, url: &Url) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !self.is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        // Stable: repeated keys keep their relative order
        params.sort_by(|a, b| a.0.cmp(&b.0));
        params
    }

    /// Checks if a query parameter is a tracking parameter
    fn is_tracking_param(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        key.starts_with("utm_") || self.removable_keys.iter().any(|k| *k == key)
    }
}

fn escape_pipes(url: &str) -> String {
    url.replace('|', "%7C")
}

/// Normalizes a URL with the default tracking key list
///
/// ```
/// use ref_cli::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("https://www.youtube.com/watch?v=abc&si=tracking"),
///     "https://www.youtube.com/watch?v=abc"
/// );
/// ```
pub fn normalize_url(url_str: &str) -> String {
    Normalizer::default().normalize(url_str)
}
