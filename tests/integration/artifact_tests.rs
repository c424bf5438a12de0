//! Integration tests for transcript artifact validation

use ref_cli::platform::VideoInfo;
use ref_cli::transcript::{
    artifact_path, check_artifacts, ProblemKind, Segment, TranscriptArtifact,
};
use tempfile::TempDir;

fn write_good_artifact(dir: &TempDir) {
    let info = VideoInfo {
        id: "good01".to_string(),
        title: "A Talk".to_string(),
        channel: "Conference".to_string(),
        published_at: Some("2024-01-01T00:00:00Z".to_string()),
    };
    let segments = vec![
        Segment {
            text: "welcome".to_string(),
            start: 0.0,
            duration: 2.0,
        },
        Segment {
            text: "goodbye".to_string(),
            start: 2.0,
            duration: 3.0,
        },
    ];
    TranscriptArtifact::from_segments("good01", &segments, Some(&info))
        .write_to(&artifact_path(dir.path(), "good01"))
        .unwrap();
}

#[test]
fn test_good_and_corrupt_artifacts() {
    let dir = TempDir::new().unwrap();
    write_good_artifact(&dir);
    std::fs::write(dir.path().join("corrupt.json"), "{\"transcript\": \"cut off").unwrap();

    let report = check_artifacts(dir.path()).unwrap();
    assert_eq!(report.total, 2);
    assert_eq!(report.valid, 1);
    assert!(!report.is_clean());
    assert_eq!(report.problems.len(), 1);

    let problem = &report.problems[0];
    assert!(problem.path.ends_with("corrupt.json"));
    assert_eq!(problem.kind, ProblemKind::Json);
    assert_eq!(problem.errors.len(), 1);
}

#[test]
fn test_missing_metadata_key_is_a_structure_problem() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("partial.json"),
        r#"{"transcript":"text","duration":4,"comments":[],"metadata":{"id":"p","title":"t"}}"#,
    )
    .unwrap();

    let report = check_artifacts(dir.path()).unwrap();
    assert_eq!(report.valid, 0);
    assert_eq!(report.problems[0].kind, ProblemKind::Structure);
    assert!(report.problems[0].errors[0].contains("channel"));
}

#[test]
fn test_empty_directory_is_clean() {
    let dir = TempDir::new().unwrap();
    let report = check_artifacts(dir.path()).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.is_clean());
}
