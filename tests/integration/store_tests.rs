//! Integration tests for the flat-file reference store

use ref_cli::storage::{
    FlatFileStore, ReferenceStore, SearchField, TranscriptUpdate, WriteOutcome,
};
use ref_cli::transcript::TranscriptFailure;
use ref_cli::url::{normalize_url, Normalizer};
use ref_cli::{EntryKind, ReferenceEntry, TranscriptRef};
use std::path::PathBuf;
use tempfile::TempDir;

fn setup() -> (TempDir, FlatFileStore) {
    let dir = TempDir::new().unwrap();
    let store =
        FlatFileStore::open(&dir.path().join("references.md"), Normalizer::default()).unwrap();
    (dir, store)
}

fn video_entry(url: &str) -> ReferenceEntry {
    ReferenceEntry::new(url, "Some Video", "Some Channel", EntryKind::YouTube)
}

fn read(store: &FlatFileStore) -> String {
    std::fs::read_to_string(store.path()).unwrap()
}

#[test]
fn test_exists_for_every_equivalent_url() {
    let (_dir, mut store) = setup();
    let entry = ReferenceEntry::new(
        "https://example.com/post?b=2&a=1",
        "Post",
        "General",
        EntryKind::General,
    );
    store.append(&entry).unwrap();

    for equivalent in [
        "https://example.com/post?a=1&b=2",
        "https://EXAMPLE.com/post/?b=2&a=1&utm_campaign=x",
        "https://example.com/post?a=1&b=2&fbclid=abc#section",
    ] {
        assert!(store.exists(equivalent).unwrap(), "{} should match", equivalent);
    }
    assert!(!store.exists("https://example.com/post?a=2").unwrap());
}

#[test]
fn test_exists_for_urls_with_separator_and_bracket_characters() {
    let (_dir, mut store) = setup();
    let urls = [
        "https://example.com/a]b",
        "https://example.com/a|b",
        "http://[::1]:8080/page",
        "https://en.wikipedia.org/wiki/Rust_(programming_language)",
    ];
    for url in urls {
        let entry = ReferenceEntry::new(normalize_url(url), "T", "General", EntryKind::General);
        store.append(&entry).unwrap();
    }

    for url in urls {
        assert!(store.exists(url).unwrap(), "{} should be found", url);
        assert_eq!(store.find(url).unwrap().unwrap().url, normalize_url(url));
    }
    assert!(read(&store).contains("|[http://[::1]:8080/page]|"));
    assert!(read(&store).contains("|[https://example.com/a%7Cb]|"));
    assert!(store.check_integrity().unwrap().is_empty());
}

#[test]
fn test_transcript_is_attached_exactly_once() {
    let (_dir, mut store) = setup();
    let url = "https://www.youtube.com/watch?v=abc123";
    store
        .append(&video_entry(url).with_transcript(TranscriptRef::Pending))
        .unwrap();
    assert!(!store.has_transcript(url).unwrap());

    let artifact = TranscriptRef::Artifact(PathBuf::from("/data/transcripts/abc123.json"));
    assert_eq!(
        store.update_transcript(url, &artifact).unwrap(),
        TranscriptUpdate::Attached
    );
    assert_eq!(
        store.update_transcript(url, &artifact).unwrap(),
        TranscriptUpdate::AlreadyPresent
    );
    assert_eq!(
        store
            .update_transcript(url, &TranscriptRef::Pending)
            .unwrap(),
        TranscriptUpdate::AlreadyPresent
    );

    let content = read(&store);
    assert_eq!(content.lines().count(), 1);
    assert!(content.trim_end().ends_with("|/data/transcripts/abc123.json"));
}

#[test]
fn test_update_transcript_without_entry() {
    let (_dir, mut store) = setup();
    let update = store
        .update_transcript(
            "https://www.youtube.com/watch?v=missing",
            &TranscriptRef::Artifact(PathBuf::from("/tmp/missing.json")),
        )
        .unwrap();
    assert_eq!(update, TranscriptUpdate::NoEntry);
    assert!(read(&store).is_empty());
}

#[test]
fn test_failure_records_only_last_diagnostic_line() {
    let (_dir, mut store) = setup();
    let url = "https://www.youtube.com/watch?v=abc123";
    let failure = TranscriptFailure::new(
        "yt_dlp",
        "Enter a URL...\nYouTube is blocking requests...\nDetailed failure message",
    );
    store
        .append(&video_entry(url).with_transcript(TranscriptRef::from(&failure)))
        .unwrap();

    let content = read(&store);
    let line = content.lines().next().unwrap();
    assert!(line.ends_with("|No transcript available (Yt Dlp method: Detailed failure message)"));
    assert!(!line.contains("Enter a URL"));
    assert!(!line.contains("blocking requests"));
}

#[test]
fn test_blocked_failure_wording() {
    let failure = TranscriptFailure::blocked("ERROR: Sign in to confirm you're not a bot");
    assert_eq!(failure.method, "blocked");
    let message = failure.message();
    assert!(message.contains("Transcript blocked by YouTube"));
    assert!(!message.contains("No transcript available"));
}

#[test]
fn test_failure_upgraded_to_artifact_by_upsert() {
    let (_dir, mut store) = setup();
    let url = "https://www.youtube.com/watch?v=abc123";
    let failure = TranscriptFailure::new("yt_dlp", "no captions");
    store
        .append(&video_entry(url).with_transcript(TranscriptRef::from(&failure)))
        .unwrap();

    let upgraded = video_entry(url)
        .with_transcript(TranscriptRef::Artifact(PathBuf::from("/t/abc123.json")));
    assert_eq!(store.upsert(&upgraded, false).unwrap(), WriteOutcome::Updated);
    assert_eq!(store.upsert(&upgraded, false).unwrap(), WriteOutcome::Unchanged);

    let entry = store.find(url).unwrap().unwrap();
    assert_eq!(
        entry.transcript,
        Some(TranscriptRef::Artifact(PathBuf::from("/t/abc123.json")))
    );
}

#[test]
fn test_integrity_reports_line_missing_category() {
    let (_dir, store) = setup();
    std::fs::write(
        store.path(),
        "2024-01-01T10:00:00|[https://example.com/a]|(A)|General|General\n\
         2024-01-01T10:05:00|[https://example.com/b]|(B)|General\n",
    )
    .unwrap();

    let violations = store.check_integrity().unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line_number, 2);
    assert_eq!(violations[0].file, "references.md");
    assert!(violations[0].content.contains("https://example.com/b"));
}

#[test]
fn test_integrity_accepts_header_and_transcript_field() {
    let (_dir, store) = setup();
    std::fs::write(
        store.path(),
        "Date|URL|Title|Source|Type\n\
         2024-01-01T10:00:00|[https://www.youtube.com/watch?v=x]|(X)|Chan|YouTube|/t/x.json\n\
         \n\
         2024-01-01T10:00:01|[https://www.youtube.com/watch?v=y]|(Y)|Chan|YouTube|None\n",
    )
    .unwrap();
    assert!(store.check_integrity().unwrap().is_empty());
}

#[test]
fn test_search_title_field() {
    let (_dir, store) = setup();
    std::fs::write(
        store.path(),
        "2024-01-01T10:00:00|[https://site.test/one]|(Example)|General|General\n\
         2024-01-01T10:00:01|[https://example.com/two]|(Other)|General|General\n",
    )
    .unwrap();

    let hits = store.search("example", SearchField::Title).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].line_number, 1);
    assert!(hits[0].line.contains("(Example)"));
    assert_eq!(hits[0].reasons, vec![SearchField::Title]);

    let all = store.search_all("example").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].reasons, vec![SearchField::Url]);
}

#[test]
fn test_backup_copies_store() {
    let (dir, mut store) = setup();
    store
        .append(&ReferenceEntry::new(
            "https://example.com/a",
            "A",
            "General",
            EntryKind::General,
        ))
        .unwrap();

    let backup = store.backup().unwrap();
    assert_eq!(backup.parent(), Some(dir.path()));
    assert!(backup
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_references.md"));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), read(&store));
}
