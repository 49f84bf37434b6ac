//! Integration tests for ReleaseWatch
//!
//! Runs the watcher against a mock GitHub API and a real checkpoint file.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use checkpointstore::{Checkpoint, CheckpointStore, FileCheckpointStore};
use releasewatch::domain::{ReleaseDescriptor, TrackedProject};
use releasewatch::fetcher::GithubFetcher;
use releasewatch::notifier::{Notifier, NotifyError};
use releasewatch::watcher::{CheckpointOutcome, ProjectOutcome, ReleaseWatcher, WatcherConfig};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier that records what it would have sent
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, project: &TrackedProject, release: &ReleaseDescriptor) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((project.display_name.clone(), release.tag.clone()));
        Ok(())
    }
}

fn release_body(tag: &str) -> serde_json::Value {
    json!({
        "tag_name": tag,
        "name": format!("Release {}", tag),
        "published_at": "2024-10-01T14:30:00Z",
        "html_url": format!("https://github.com/acme/x/releases/tag/{}", tag),
    })
}

async fn mount_latest(server: &MockServer, name: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/{}/releases/latest", name)))
        .respond_with(response)
        .mount(server)
        .await;
}

fn watcher(
    server: &MockServer,
    projects: Vec<TrackedProject>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<FileCheckpointStore>,
) -> ReleaseWatcher {
    let fetcher = GithubFetcher::new(server.uri(), None, Duration::from_secs(5)).expect("Failed to build fetcher");
    ReleaseWatcher::new(WatcherConfig::default(), projects, Arc::new(fetcher), notifier, store)
}

#[tokio::test]
async fn test_unchanged_and_new_release() {
    let server = MockServer::start().await;
    mount_latest(&server, "a", ResponseTemplate::new(200).set_body_json(release_body("v1.0"))).await;
    mount_latest(&server, "b", ResponseTemplate::new(200).set_body_json(release_body("v2.3"))).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("release_state.json");
    std::fs::write(&path, r#"{"a": "v1.0"}"#).unwrap();
    let store = Arc::new(FileCheckpointStore::json(&path));
    let notifier = Arc::new(RecordingNotifier::default());

    let projects = vec![
        TrackedProject::new("acme", "a", "Project A"),
        TrackedProject::new("acme", "b", "Project B"),
    ];
    let report = watcher(&server, projects, notifier.clone(), store.clone())
        .run_once()
        .await;

    assert_eq!(notifier.sent(), vec![("Project B".to_string(), "v2.3".to_string())]);
    assert_eq!(report.checkpoint, CheckpointOutcome::Saved);
    assert_eq!(
        report.outcome("a"),
        Some(&ProjectOutcome::Unchanged {
            tag: "v1.0".to_string()
        })
    );

    let expected: Checkpoint = [("a", "v1.0"), ("b", "v2.3")].into_iter().collect();
    assert_eq!(store.read().unwrap(), Some(expected));
}

#[tokio::test]
async fn test_second_run_is_quiet() {
    let server = MockServer::start().await;
    mount_latest(&server, "a", ResponseTemplate::new(200).set_body_json(release_body("v1.0"))).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("release_state.json");
    let store = Arc::new(FileCheckpointStore::json(&path));
    let notifier = Arc::new(RecordingNotifier::default());
    let watcher = watcher(
        &server,
        vec![TrackedProject::new("acme", "a", "Project A")],
        notifier.clone(),
        store,
    );

    let first = watcher.run_once().await;
    assert_eq!(first.notified(), 1);
    let written = std::fs::read_to_string(&path).unwrap();

    let second = watcher.run_once().await;
    assert_eq!(second.notified(), 0);
    assert_eq!(second.checkpoint, CheckpointOutcome::Untouched);
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
}

#[tokio::test]
async fn test_upstream_failure_leaves_checkpoint_absent() {
    let server = MockServer::start().await;
    mount_latest(
        &server,
        "a",
        ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})),
    )
    .await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("release_state.json");
    let store = Arc::new(FileCheckpointStore::json(&path));
    let notifier = Arc::new(RecordingNotifier::default());

    let report = watcher(
        &server,
        vec![TrackedProject::new("acme", "a", "Project A")],
        notifier.clone(),
        store,
    )
    .run_once()
    .await;

    assert!(notifier.sent().is_empty());
    assert_eq!(report.skipped(), 1);
    assert!(!path.exists());
}

#[tokio::test]
async fn test_corrupt_checkpoint_is_treated_as_empty() {
    let server = MockServer::start().await;
    mount_latest(&server, "a", ResponseTemplate::new(200).set_body_json(release_body("v1.0"))).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("release_state.json");
    std::fs::write(&path, "not json at all").unwrap();
    let store = Arc::new(FileCheckpointStore::json(&path));
    let notifier = Arc::new(RecordingNotifier::default());

    let report = watcher(
        &server,
        vec![TrackedProject::new("acme", "a", "Project A")],
        notifier.clone(),
        store.clone(),
    )
    .run_once()
    .await;

    assert_eq!(report.notified(), 1);
    let expected: Checkpoint = [("a", "v1.0")].into_iter().collect();
    assert_eq!(store.read().unwrap(), Some(expected));
}

#[tokio::test]
async fn test_bare_checkpoint_single_project() {
    let server = MockServer::start().await;
    mount_latest(&server, "a", ResponseTemplate::new(200).set_body_json(release_body("v1.1"))).await;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("last_release.txt");
    std::fs::write(&path, "v1.0\n").unwrap();
    let store = Arc::new(FileCheckpointStore::bare(&path, "a"));
    let notifier = Arc::new(RecordingNotifier::default());

    watcher(
        &server,
        vec![TrackedProject::new("acme", "a", "Project A")],
        notifier.clone(),
        store,
    )
    .run_once()
    .await;

    assert_eq!(notifier.sent(), vec![("Project A".to_string(), "v1.1".to_string())]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "v1.1\n");
}
