//! Collaborators shared by every processed URL

use crate::config::Config;
use crate::fetch::{build_api_client, LynxDumper, RedirectResolver, TitleExtractor, UrlResolver};
use crate::platform::{VideoMetadataApi, YouTubeDataApi};
use crate::storage::{FlatFileStore, ReferenceStore};
use crate::transcript::TranscriptFetcher;
use crate::url::Normalizer;
use std::time::Duration;

/// Everything `process_url` needs, built once per invocation
///
/// Each external concern sits behind a trait object so tests can swap in
/// doubles for the network, the page dumper and the downloader.
pub struct RefContext {
    pub normalizer: Normalizer,
    pub resolver: Box<dyn UrlResolver>,
    pub titles: TitleExtractor,
    pub metadata: Box<dyn VideoMetadataApi>,
    pub transcripts: TranscriptFetcher,
    pub store: Box<dyn ReferenceStore>,
    /// Pause between URLs in batch mode
    pub batch_delay: Duration,
}

impl RefContext {
    /// Wires the production collaborators from the configuration
    ///
    /// Opens (and if needed creates) the reference store. The YouTube API
    /// key is read from `YOUTUBE_API_KEY`.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let normalizer = Normalizer::new(&config.removable_keys);

        let resolver = RedirectResolver::new(&config.resolver)?;
        let titles = TitleExtractor::new(Box::new(LynxDumper::new(
            config.tools.page_dump.clone(),
            Duration::from_secs(config.tools.tool_timeout_secs),
        )));
        let metadata = YouTubeDataApi::from_env(
            build_api_client(config.resolver.timeout_secs.max(10))?,
            config.youtube.api_base.clone(),
        );
        if !metadata.has_api_key() {
            tracing::warn!(
                "YOUTUBE_API_KEY is not set; video titles will be placeholders (run `ref --set-api-key`)"
            );
        }

        let transcripts = TranscriptFetcher::from_tools(config.transcripts_dir()?, &config.tools);
        let store = FlatFileStore::open(&config.references_file()?, normalizer.clone())?;
        tracing::debug!("Using reference store {}", store.path().display());

        Ok(Self {
            normalizer,
            resolver: Box::new(resolver),
            titles,
            metadata: Box::new(metadata),
            transcripts,
            store: Box::new(store),
            batch_delay: Duration::from_millis(config.batch.delay_ms),
        })
    }
}
