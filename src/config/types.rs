use serde::{Deserialize, Serialize};

/// Tracking query keys removed by default (every `utm_*` key is removed too)
pub const DEFAULT_REMOVABLE_KEYS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "_ga",
    "mc_eid",
    "igshid",
    "ref",
    "ref_src",
    "referrer",
    "source",
    "campaign",
    "share",
    "affiliate",
    "aff_id",
    "si",
];

/// Browser user agent sent while resolving redirects
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for ref-cli
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Query keys stripped during normalization
    #[serde(rename = "removable-keys", default = "default_removable_keys")]
    pub removable_keys: Vec<String>,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub youtube: YouTubeConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            removable_keys: default_removable_keys(),
            paths: PathsConfig::default(),
            resolver: ResolverConfig::default(),
            tools: ToolsConfig::default(),
            youtube: YouTubeConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}

fn default_removable_keys() -> Vec<String> {
    DEFAULT_REMOVABLE_KEYS.iter().map(|k| k.to_string()).collect()
}

/// Filesystem locations; a leading `~` is expanded to the home directory
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding `references.md`
    pub references: String,

    /// Directory holding transcript artifacts
    pub transcripts: String,

    /// Directory holding `ref.log` and `ref_errors.log`
    pub logs: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            references: "~/references".to_string(),
            transcripts: "~/references/transcripts".to_string(),
            logs: "~/references/logs".to_string(),
        }
    }
}

/// Redirect resolution behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on 5xx responses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff delay; doubles on every retry (milliseconds)
    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Domains that are never fetched (e.g. "*.medium.com")
    #[serde(rename = "rate-limited-domains")]
    pub rate_limited_domains: Vec<String>,

    /// Generic homepages that mean a redirect went wrong
    #[serde(rename = "homepage-traps")]
    pub homepage_traps: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            backoff_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_limited_domains: vec!["*.medium.com".to_string()],
            homepage_traps: vec!["https://www.msn.com/".to_string()],
        }
    }
}

/// External tool invocation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Page dump binary used for title extraction
    #[serde(rename = "page-dump")]
    pub page_dump: String,

    /// Subtitle downloader binary
    pub downloader: String,

    /// Timeout for the page dump tool (seconds)
    #[serde(rename = "tool-timeout-secs")]
    pub tool_timeout_secs: u64,

    /// Timeout for a single downloader invocation (seconds)
    #[serde(rename = "transcript-timeout-secs")]
    pub transcript_timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            page_dump: "lynx".to_string(),
            downloader: "yt-dlp".to_string(),
            tool_timeout_secs: 30,
            transcript_timeout_secs: 300,
        }
    }
}

/// YouTube Data API settings; the key itself comes from `YOUTUBE_API_KEY`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct YouTubeConfig {
    #[serde(rename = "api-base")]
    pub api_base: String,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
        }
    }
}

/// Batch (`--file`) processing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between URLs (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { delay_ms: 1000 }
    }
}
