//! End-to-end tests for URL processing
//!
//! Every external collaborator is replaced by a double so these run
//! without network access or downloader binaries.

use async_trait::async_trait;
use ref_cli::fetch::{PageDumper, TitleError, TitleExtractor, UrlResolver};
use ref_cli::pipeline::{process_file, process_url, refresh_transcript, RefreshOutcome};
use ref_cli::platform::{MetadataError, PlaylistInfo, VideoInfo, VideoMetadataApi};
use ref_cli::storage::{FlatFileStore, ReferenceStore, WriteOutcome};
use ref_cli::transcript::{
    Segment, SubtitleDownloader, SubtitleStrategy, TranscriptApi, TranscriptApiError,
    TranscriptFetcher,
};
use ref_cli::{EntryKind, ProcessOutcome, RefContext, RefError, ReferenceEntry, TranscriptRef};
use ref_cli::url::Normalizer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Returns URLs unchanged and counts calls
struct CountingResolver {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl UrlResolver for CountingResolver {
    async fn resolve(&self, url: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        url.to_string()
    }
}

/// Serves canned markup; URLs containing "broken" fail
struct FakeDumper {
    calls: Arc<AtomicUsize>,
    pages: HashMap<String, String>,
}

#[async_trait]
impl PageDumper for FakeDumper {
    async fn dump(&self, url: &str) -> Result<String, TitleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("broken") {
            return Err(TitleError::DeadLink);
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body>nothing here</body></html>".to_string()))
    }
}

/// Metadata keyed by video id; titles can be changed between calls
struct FakeMetadata {
    titles: Arc<Mutex<HashMap<String, String>>>,
}

#[async_trait]
impl VideoMetadataApi for FakeMetadata {
    async fn video(&self, video_id: &str) -> Result<VideoInfo, MetadataError> {
        let title = self
            .titles
            .lock()
            .unwrap()
            .get(video_id)
            .cloned()
            .ok_or_else(|| MetadataError::VideoNotFound(video_id.to_string()))?;
        Ok(VideoInfo {
            id: video_id.to_string(),
            title,
            channel: "Test Channel".to_string(),
            published_at: Some("2024-02-03T04:05:06Z".to_string()),
        })
    }

    async fn playlist(&self, playlist_id: &str) -> Result<PlaylistInfo, MetadataError> {
        let videos = vec![
            self.video("pl_one").await?,
            self.video("pl_two").await?,
        ];
        Ok(PlaylistInfo {
            id: playlist_id.to_string(),
            title: "Lecture Series".to_string(),
            channel: "Curator".to_string(),
            videos,
        })
    }
}

/// Caption source that can be switched between blocked and working
struct FakeCaptions {
    blocked: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TranscriptApi for FakeCaptions {
    fn name(&self) -> &str {
        "yt_dlp"
    }

    async fn fetch(&self, video_id: &str) -> Result<Vec<Segment>, TranscriptApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.blocked.load(Ordering::SeqCst) {
            return Err(TranscriptApiError::Blocked(
                "Sign in to confirm you're not a bot".to_string(),
            ));
        }
        Ok(vec![
            Segment {
                text: format!("intro to {}", video_id),
                start: 0.0,
                duration: 2.5,
            },
            Segment {
                text: "the end".to_string(),
                start: 2.5,
                duration: 1.5,
            },
        ])
    }
}

/// Produces manual English subtitles only
struct FakeSubtitles;

#[async_trait]
impl SubtitleDownloader for FakeSubtitles {
    fn name(&self) -> &str {
        "yt_dlp"
    }

    async fn check_video(&self, _url: &str) -> Result<(), TranscriptApiError> {
        Ok(())
    }

    async fn download(
        &self,
        _url: &str,
        strategy: SubtitleStrategy,
        output_stem: &Path,
    ) -> Result<(), TranscriptApiError> {
        if strategy != SubtitleStrategy::ManualOnly {
            return Err(TranscriptApiError::NoTranscript("no auto captions".to_string()));
        }
        let path = format!("{}.en.vtt", output_stem.display());
        std::fs::write(path, "WEBVTT\n\n00:00.000 --> 00:01.000\nhello\n")?;
        Ok(())
    }
}

struct Harness {
    ctx: RefContext,
    dir: TempDir,
    resolves: Arc<AtomicUsize>,
    dumps: Arc<AtomicUsize>,
    caption_calls: Arc<AtomicUsize>,
    blocked: Arc<AtomicBool>,
    titles: Arc<Mutex<HashMap<String, String>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_pages(HashMap::new())
    }

    fn with_pages(pages: HashMap<String, String>) -> Self {
        let dir = TempDir::new().unwrap();
        let resolves = Arc::new(AtomicUsize::new(0));
        let dumps = Arc::new(AtomicUsize::new(0));
        let caption_calls = Arc::new(AtomicUsize::new(0));
        let blocked = Arc::new(AtomicBool::new(false));
        let titles = Arc::new(Mutex::new(HashMap::from([
            ("abc123".to_string(), "Rust: Ownership Explained!".to_string()),
            ("pl_one".to_string(), "Part One".to_string()),
            ("pl_two".to_string(), "Part Two".to_string()),
        ])));

        let normalizer = Normalizer::default();
        let store =
            FlatFileStore::open(&dir.path().join("references.md"), normalizer.clone()).unwrap();
        let transcripts = TranscriptFetcher::new(
            dir.path().join("transcripts"),
            Box::new(FakeCaptions {
                blocked: blocked.clone(),
                calls: caption_calls.clone(),
            }),
            Box::new(FakeSubtitles),
        );

        let ctx = RefContext {
            normalizer,
            resolver: Box::new(CountingResolver {
                calls: resolves.clone(),
            }),
            titles: TitleExtractor::new(Box::new(FakeDumper {
                calls: dumps.clone(),
                pages,
            })),
            metadata: Box::new(FakeMetadata {
                titles: titles.clone(),
            }),
            transcripts,
            store: Box::new(store),
            batch_delay: Duration::ZERO,
        };

        Self {
            ctx,
            dir,
            resolves,
            dumps,
            caption_calls,
            blocked,
            titles,
        }
    }

    fn lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.ctx.store.path())
            .unwrap()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn page(title: &str) -> String {
    format!("<html><head><title>{}</title></head><body></body></html>", title)
}

#[tokio::test]
async fn test_pdf_skips_network_and_deduplicates() {
    let mut h = Harness::new();
    let url = "https://example.com/papers/attention.pdf";

    let outcome = process_url(&mut h.ctx, url, false).await.unwrap();
    match &outcome {
        ProcessOutcome::Recorded { title, .. } => assert_eq!(title, "attention.pdf"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.resolves.load(Ordering::SeqCst), 0);
    assert_eq!(h.dumps.load(Ordering::SeqCst), 0);

    let again = process_url(&mut h.ctx, url, false).await.unwrap();
    assert!(matches!(again, ProcessOutcome::AlreadyRecorded { .. }));
    assert_eq!(h.lines().len(), 1);
    assert!(h.lines()[0].contains("|(attention.pdf)|PDF Document|General"));

    process_url(&mut h.ctx, url, true).await.unwrap();
    assert_eq!(h.lines().len(), 2);
}

#[tokio::test]
async fn test_generic_page_is_deduplicated_after_normalization() {
    let mut h = Harness::with_pages(HashMap::from([(
        "https://example.com/article".to_string(),
        page("An Example Article"),
    )]));

    let first = process_url(&mut h.ctx, "https://example.com/article?utm_source=feed", false)
        .await
        .unwrap();
    match &first {
        ProcessOutcome::Recorded { url, title, write, .. } => {
            assert_eq!(url, "https://example.com/article");
            assert_eq!(title, "An Example Article");
            assert_eq!(*write, WriteOutcome::Appended);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let second = process_url(&mut h.ctx, "https://EXAMPLE.com/article/#comments", false)
        .await
        .unwrap();
    assert!(matches!(second, ProcessOutcome::AlreadyRecorded { .. }));

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|[https://example.com/article]|(An Example Article)|General|General"));
}

#[tokio::test]
async fn test_page_without_title_records_sentinel() {
    let mut h = Harness::new();
    process_url(&mut h.ctx, "https://example.com/untitled", false)
        .await
        .unwrap();
    assert!(h.lines()[0].contains("|(No title found)|"));
}

#[tokio::test]
async fn test_unreadable_page_is_skipped() {
    let mut h = Harness::new();
    let outcome = process_url(&mut h.ctx, "https://broken.example.com/gone", false)
        .await
        .unwrap();
    match outcome {
        ProcessOutcome::Skipped { reason, .. } => {
            assert_eq!(reason, "Error: Unable to access document")
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(h.lines().is_empty());
}

#[tokio::test]
async fn test_search_pages_are_rejected() {
    let mut h = Harness::new();
    let err = process_url(
        &mut h.ctx,
        "https://www.youtube.com/results?search_query=rust",
        false,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RefError::Unsupported(_)));
    assert_eq!(h.resolves.load(Ordering::SeqCst), 0);
    assert!(h.lines().is_empty());
}

#[tokio::test]
async fn test_youtube_video_with_transcript() {
    let mut h = Harness::new();

    let outcome = process_url(&mut h.ctx, "https://youtu.be/abc123?si=share", false)
        .await
        .unwrap();
    let expected_path = h.dir.path().join("transcripts").join("abc123.json");
    match &outcome {
        ProcessOutcome::Recorded {
            url,
            title,
            transcript,
            ..
        } => {
            assert_eq!(url, "https://www.youtube.com/watch?v=abc123");
            assert_eq!(title, "Rust Ownership Explained");
            assert_eq!(
                transcript.as_ref(),
                Some(&TranscriptRef::Artifact(expected_path.clone()))
            );
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(expected_path.exists());

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|(Rust Ownership Explained)|Test Channel|YouTube|"));

    let again = process_url(&mut h.ctx, "https://www.youtube.com/watch?v=abc123", false)
        .await
        .unwrap();
    assert!(matches!(again, ProcessOutcome::AlreadyRecorded { .. }));
    assert_eq!(h.caption_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.lines().len(), 1);
}

#[tokio::test]
async fn test_blocked_transcript_is_upgraded_on_retry() {
    let mut h = Harness::new();
    h.blocked.store(true, Ordering::SeqCst);

    let url = "https://www.youtube.com/watch?v=abc123";
    process_url(&mut h.ctx, url, false).await.unwrap();
    let entry = h.ctx.store.find(url).unwrap().unwrap();
    match entry.transcript {
        Some(TranscriptRef::Failure(message)) => {
            assert!(message.starts_with("Transcript blocked by YouTube"));
            assert!(!message.contains('|'));
        }
        other => panic!("unexpected transcript slot: {:?}", other),
    }

    h.blocked.store(false, Ordering::SeqCst);
    let outcome = process_url(&mut h.ctx, url, false).await.unwrap();
    assert!(matches!(
        outcome,
        ProcessOutcome::Recorded {
            write: WriteOutcome::Updated,
            ..
        }
    ));

    let entry = h.ctx.store.find(url).unwrap().unwrap();
    assert!(matches!(entry.transcript, Some(TranscriptRef::Artifact(_))));
    assert_eq!(h.lines().len(), 1);
}

#[tokio::test]
async fn test_force_rewrites_video_metadata_and_reuses_artifact() {
    let mut h = Harness::new();
    let url = "https://www.youtube.com/watch?v=abc123";
    process_url(&mut h.ctx, url, false).await.unwrap();

    h.titles
        .lock()
        .unwrap()
        .insert("abc123".to_string(), "Renamed Video".to_string());
    let outcome = process_url(&mut h.ctx, url, true).await.unwrap();
    assert!(matches!(
        outcome,
        ProcessOutcome::Recorded {
            write: WriteOutcome::Updated,
            ..
        }
    ));

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|(Renamed Video)|"));
    assert_eq!(h.caption_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_playlist_records_entry_and_members() {
    let mut h = Harness::new();
    let outcome = process_url(
        &mut h.ctx,
        "https://www.youtube.com/playlist?list=PL123",
        false,
    )
    .await
    .unwrap();

    match outcome {
        ProcessOutcome::Playlist {
            title,
            videos,
            recorded,
            ..
        } => {
            assert_eq!(title, "Lecture Series");
            assert_eq!(videos, 2);
            assert_eq!(recorded, 2);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let lines = h.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("|(Lecture Series)|Curator|YouTube"));
    assert!(lines[1].contains("[https://www.youtube.com/watch?v=pl_one]"));
    assert!(lines[2].contains("[https://www.youtube.com/watch?v=pl_two]"));
}

#[tokio::test]
async fn test_rumble_video_uses_page_title_and_subtitles() {
    let url = "https://rumble.com/v4abc-a-talk.html";
    let mut h = Harness::with_pages(HashMap::from([(
        url.to_string(),
        r#"<html><head><meta property="og:title" content="A Talk"><title>A Talk - Rumble</title></head></html>"#
            .to_string(),
    )]));

    let outcome = process_url(&mut h.ctx, url, false).await.unwrap();
    let expected: PathBuf = h.dir.path().join("transcripts").join("v4abc-a-talk.en.vtt");
    match &outcome {
        ProcessOutcome::Recorded {
            title, transcript, ..
        } => {
            assert_eq!(title, "A Talk");
            assert_eq!(transcript.as_ref(), Some(&TranscriptRef::Artifact(expected)));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(h.lines()[0].contains("|(A Talk)|Rumble|General|"));
}

#[tokio::test]
async fn test_refresh_transcript_fills_pending_entry() {
    let mut h = Harness::new();
    let url = "https://www.youtube.com/watch?v=abc123";
    let entry = ReferenceEntry::new(url, "Old Entry", "Test Channel", EntryKind::YouTube)
        .with_transcript(TranscriptRef::Pending);
    h.ctx.store.append(&entry).unwrap();

    let outcome = refresh_transcript(&mut h.ctx, "https://youtu.be/abc123")
        .await
        .unwrap();
    assert!(matches!(outcome, RefreshOutcome::Attached { .. }));

    let again = refresh_transcript(&mut h.ctx, url).await.unwrap();
    assert!(matches!(again, RefreshOutcome::AlreadyPresent { .. }));

    let lines = h.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("|(Old Entry)|"));
    assert!(lines[0].ends_with("abc123.json"));
}

#[tokio::test]
async fn test_refresh_transcript_requires_recorded_entry() {
    let mut h = Harness::new();
    let outcome = refresh_transcript(&mut h.ctx, "https://www.youtube.com/watch?v=abc123")
        .await
        .unwrap();
    assert!(matches!(outcome, RefreshOutcome::NotRecorded { .. }));
    assert!(h.lines().is_empty());
}

#[tokio::test]
async fn test_batch_file_comments_out_successes_only() {
    let mut h = Harness::with_pages(HashMap::from([(
        "https://example.com/a".to_string(),
        page("Page A"),
    )]));
    let batch = h.dir.path().join("urls.txt");
    std::fs::write(
        &batch,
        "# reading list\n\nhttps://example.com/a\nhttps://broken.example.com/x\nhttps://example.com/b\n",
    )
    .unwrap();

    let report = process_file(&mut h.ctx, &batch, false).await.unwrap();
    assert_eq!(report.processed, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);

    let rewritten = std::fs::read_to_string(&batch).unwrap();
    assert_eq!(
        rewritten,
        "# reading list\n\n# https://example.com/a\nhttps://broken.example.com/x\n# https://example.com/b\n"
    );
    assert_eq!(h.lines().len(), 2);

    // A second pass only retries the line that failed
    let report = process_file(&mut h.ctx, &batch, false).await.unwrap();
    assert_eq!(report.processed, 1);
}
