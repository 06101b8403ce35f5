use log_tail::{Error, SourceConfig, StopOutcome, TailConfig, TailStream, tail_file, tail_file_custom};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio_stream::StreamExt;

/// Helper function to collect lines from a stream until it ends or goes quiet
async fn collect_lines(stream: &mut TailStream, quiet: Duration) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(Some(line)) = tokio::time::timeout(quiet, stream.next()).await {
        lines.push(line);
    }
    lines
}

fn write_file(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

fn append(path: &Path, content: &str) {
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
}

#[tokio::test]
async fn test_nonexistent_file_fails_immediately() {
    let result = tail_file("definitely_nonexistent_file_12345.log", 64).await;

    match result {
        Err(Error::FileNotFound { path }) => {
            assert!(path.contains("definitely_nonexistent_file_12345.log"))
        }
        other => panic!("Expected FileNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_native_reads_file_in_order_and_ends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("abc.log");
    write_file(&path, "a\nb\nc\n");

    let config = TailConfig::new(64).with_source(SourceConfig::Native {
        start_offset: 0,
        follow: false,
    });
    let mut tail = TailStream::with_config(&path, config).await.unwrap();

    let lines = collect_lines(&mut tail, Duration::from_secs(5)).await;
    assert_eq!(lines, vec!["a", "b", "c"]);
    assert!(tail.error().is_none());
    assert_eq!(tail.stop().await, StopOutcome::Graceful);
}

#[tokio::test]
async fn test_native_line_too_long_reports_buffer_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.log");
    write_file(&path, &format!("fine\n{}\nunreached\n", "x".repeat(100)));

    let config = TailConfig::new(32).with_source(SourceConfig::native());
    let mut tail = TailStream::with_config(&path, config).await.unwrap();

    let lines = collect_lines(&mut tail, Duration::from_secs(5)).await;
    assert_eq!(lines, vec!["fine"]);
    assert!(matches!(tail.error(), Some(Error::BufferTooSmall { capacity: 32 })));
    tail.stop().await;
}

#[tokio::test]
async fn test_native_stop_after_file_removed_is_graceful() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("removed.log");
    write_file(&path, "before removal\n");

    let config = TailConfig::new(64).with_source(SourceConfig::native());
    let mut tail = TailStream::with_config(&path, config).await.unwrap();
    assert_eq!(tail.next().await.as_deref(), Some("before removal"));

    std::fs::remove_file(&path).unwrap();
    let rest = collect_lines(&mut tail, Duration::from_secs(5)).await;
    assert!(rest.is_empty());

    let started = std::time::Instant::now();
    assert_eq!(tail.stop().await, StopOutcome::Graceful);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_tail_follows_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("follow.log");
    write_file(&path, "a\nb\nc\n");

    let mut tail = tail_file(&path, 64).await.unwrap();
    let lines = collect_lines(&mut tail, Duration::from_millis(500)).await;
    assert_eq!(lines, vec!["a", "b", "c"]);

    append(&path, "d\ne\n");
    let lines = collect_lines(&mut tail, Duration::from_secs(2)).await;
    assert_eq!(lines, vec!["d", "e"]);

    let started = std::time::Instant::now();
    let outcome = tail.stop().await;
    assert_ne!(outcome, StopOutcome::AlreadyStopped);
    // Interrupt or, if the follower ignores it, the kill after the timeout.
    assert!(started.elapsed() < Duration::from_secs(3));

    assert_eq!(tail.next().await, None);
    assert!(tail.error().is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_process_tail_without_follow_closes_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("once.log");
    write_file(&path, "one\ntwo\n");

    let mut tail = tail_file_custom(vec!["-c".to_string(), "+1".to_string()], &path, 64)
        .await
        .unwrap();

    let lines = collect_lines(&mut tail, Duration::from_secs(5)).await;
    assert_eq!(lines, vec!["one", "two"]);
    assert!(tail.error().is_none());
    assert_eq!(tail.stop().await, StopOutcome::Graceful);
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawn.log");
    write_file(&path, "");

    let config = TailConfig::new(64).with_source(SourceConfig::Process {
        program: "definitely-not-a-real-follower".to_string(),
        args: Vec::new(),
    });
    let result = TailStream::with_config(&path, config).await;

    assert!(matches!(result, Err(Error::Spawn { .. })));
}
