//! End-to-end generation lifecycle tests against a mock generation service
//!
//! These tests drive the public orchestrator API and verify:
//! - Submission, polling and resolution of the happy paths
//! - Every lifecycle failure is surfaced verbatim and leaves the session reusable
//! - The poll budget is honoured exactly
//! - Session resets and newer runs invalidate stale results

mod common;

use common::{
    USER_ID, create_test_orchestrator, drain_events, ended_idle, error_messages, labels,
    mount_status, mount_status_times, mount_submit, status_path,
};
use async_trait::async_trait;
use effect_gen::{
    AssetReference, AssetUploader, Error, Event, LocalFile, MediaKind, ProgressLabel, Session,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INPUT_URL: &str = "https://contents.example/in.jpg";

async fn session_with_asset() -> Session {
    let session = Session::new();
    session.set_asset(AssetReference::new(INPUT_URL)).await;
    session
}

#[tokio::test]
async fn processing_then_completed_resolves_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .and(body_partial_json(json!({ "imageUrl": INPUT_URL, "userId": USER_ID })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j1" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_status_times(&server, "j1", json!({ "status": "processing" }), 1).await;
    mount_status_times(
        &server,
        "j1",
        json!({ "status": "completed", "result": { "mediaUrl": "https://x/a.png" } }),
        1,
    )
    .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let media = orchestrator.generate(&session).await.unwrap();

    assert_eq!(media.url, "https://x/a.png");
    assert_eq!(media.kind, MediaKind::Image);
    assert_eq!(session.last_media().await, Some(media.clone()));

    let events = drain_events(&mut rx);
    assert_eq!(
        labels(&events),
        vec![
            ProgressLabel::Submitting,
            ProgressLabel::Queued,
            ProgressLabel::Processing { attempt: 1 },
            ProgressLabel::Complete,
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::MediaReady { media: m } if *m == media)));
    assert!(ended_idle(&events));
}

#[tokio::test]
async fn sequence_result_resolves_video() {
    let server = MockServer::start().await;
    mount_submit(&server, "j1").await;
    mount_status(
        &server,
        "j1",
        json!({ "status": "completed", "result": [{ "video": "https://x/b.mp4" }] }),
    )
    .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let session = session_with_asset().await;

    let media = orchestrator.generate(&session).await.unwrap();

    assert_eq!(media.url, "https://x/b.mp4");
    assert_eq!(media.kind, MediaKind::Video);
}

#[tokio::test]
async fn timeout_after_exactly_sixty_status_requests() {
    let server = MockServer::start().await;
    mount_submit(&server, "j1").await;
    Mock::given(method("GET"))
        .and(path(status_path("j1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" })))
        .expect(60)
        .mount(&server)
        .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let err = orchestrator.generate(&session).await.unwrap_err();

    assert!(matches!(err, Error::PollTimeout { attempts: 60 }));
    let events = drain_events(&mut rx);
    assert_eq!(error_messages(&events), vec!["Job timed out after 60 polls"]);

    let labels = labels(&events);
    assert_eq!(labels.last(), Some(&ProgressLabel::Error));
    assert!(labels.contains(&ProgressLabel::Processing { attempt: 60 }));
    assert!(!labels.contains(&ProgressLabel::Processing { attempt: 61 }));
    // MockServer verifies the expect(60) on drop
}

#[tokio::test]
async fn submission_failure_never_polls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .expect(0)
        .mount(&server)
        .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let err = orchestrator.generate(&session).await.unwrap_err();

    assert!(matches!(err, Error::Submission { .. }));
    let events = drain_events(&mut rx);
    assert_eq!(
        error_messages(&events),
        vec!["Failed to submit job: 500 Internal Server Error"]
    );
    assert!(ended_idle(&events));
}

#[tokio::test]
async fn job_failure_keeps_asset_for_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j2" })))
        .mount(&server)
        .await;
    mount_status(
        &server,
        "j1",
        json!({ "status": "failed", "error": "No face detected" }),
    )
    .await;
    mount_status(
        &server,
        "j2",
        json!({ "status": "completed", "result": { "image": "https://x/c.jpg" } }),
    )
    .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let err = orchestrator.generate(&session).await.unwrap_err();
    assert_eq!(err.to_string(), "No face detected");
    assert_eq!(
        error_messages(&drain_events(&mut rx)),
        vec!["No face detected"]
    );
    assert_eq!(
        session.current_asset().await,
        Some(AssetReference::new(INPUT_URL))
    );

    let media = orchestrator.generate(&session).await.unwrap();
    assert_eq!(media.url, "https://x/c.jpg");
}

#[tokio::test]
async fn status_transport_failure_is_reported() {
    let server = MockServer::start().await;
    mount_submit(&server, "j1").await;
    Mock::given(method("GET"))
        .and(path(status_path("j1")))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let session = session_with_asset().await;

    let err = orchestrator.generate(&session).await.unwrap_err();

    assert!(matches!(err, Error::PollTransport { attempt: 0, .. }));
    assert_eq!(
        err.to_string(),
        "Failed to check status: 503 Service Unavailable"
    );
}

#[tokio::test]
async fn completed_without_locator_is_resolution_error() {
    let server = MockServer::start().await;
    mount_submit(&server, "j1").await;
    mount_status(
        &server,
        "j1",
        json!({ "status": "completed", "result": { "thumbnail": "https://x/t.jpg" } }),
    )
    .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let err = orchestrator.generate(&session).await.unwrap_err();

    assert!(matches!(err, Error::ResultResolution(_)));
    assert_eq!(session.last_media().await, None);
    let messages = error_messages(&drain_events(&mut rx));
    assert!(messages[0].starts_with("No image URL in response"));
}

#[tokio::test]
async fn reset_during_polling_drops_the_run_silently() {
    let server = MockServer::start().await;
    mount_submit(&server, "j1").await;
    mount_status(&server, "j1", json!({ "status": "processing" })).await;

    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(&server, &temp_dir);
    config.poll = effect_gen::PollConfig {
        max_attempts: 60,
        interval: Duration::from_millis(50),
    };
    let orchestrator = effect_gen::LifecycleOrchestrator::new(config).unwrap();
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let run = orchestrator.generate(&session);
    let reset = async {
        tokio::time::sleep(Duration::from_millis(120)).await;
        orchestrator.reset(&session).await;
    };
    let (result, ()) = tokio::join!(run, reset);

    assert!(matches!(result, Err(Error::Superseded)));
    assert_eq!(session.current_asset().await, None);
    assert_eq!(session.last_media().await, None);

    let events = drain_events(&mut rx);
    assert!(error_messages(&events).is_empty());
    assert!(!labels(&events).contains(&ProgressLabel::Error));

    // the cancelled run publishes nothing after the reset
    let reset_at = events
        .iter()
        .position(|e| matches!(e, Event::SessionReset))
        .unwrap();
    assert_eq!(
        labels(&events[reset_at..]),
        vec![ProgressLabel::Idle]
    );
}

#[tokio::test]
async fn upload_then_generate_uses_uploaded_asset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-emd-upload-url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("{}/signed-put", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/signed-put"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    mount_submit(&server, "j1").await;
    mount_status(
        &server,
        "j1",
        json!({ "status": "completed", "result": { "mediaUrl": "https://x/a.png" } }),
    )
    .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = Session::new();

    let file = LocalFile::new("face.png", "image/png", vec![0u8; 64]);
    let asset = orchestrator.upload(&session, file).await.unwrap();

    assert!(asset
        .as_str()
        .starts_with(&format!("{}/contents/", server.uri())));
    assert_eq!(session.current_asset().await, Some(asset.clone()));

    let events = drain_events(&mut rx);
    assert_eq!(
        labels(&events),
        vec![ProgressLabel::Uploading, ProgressLabel::Idle]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Uploaded { asset: a } if *a == asset)));

    orchestrator.generate(&session).await.unwrap();

    let submitted = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&submitted.body).unwrap();
    assert_eq!(body["imageUrl"], asset.as_str());
}

#[tokio::test]
async fn failed_upload_reports_error_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-emd-upload-url"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let mut rx = orchestrator.subscribe();
    let session = Session::new();

    let file = LocalFile::new("face.png", "image/png", vec![0u8; 64]);
    let err = orchestrator.upload(&session, file).await.unwrap_err();

    assert!(matches!(err, Error::Upload(_)));
    assert_eq!(session.current_asset().await, None);

    let events = drain_events(&mut rx);
    assert_eq!(
        labels(&events),
        vec![ProgressLabel::Uploading, ProgressLabel::Error]
    );
    assert_eq!(error_messages(&events), vec![err.to_string()]);
    assert!(ended_idle(&events));
}

#[tokio::test]
async fn newer_run_supersedes_run_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j1" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": "j2" })))
        .mount(&server)
        .await;
    mount_status(&server, "j1", json!({ "status": "processing" })).await;
    mount_status(
        &server,
        "j2",
        json!({ "status": "completed", "result": { "mediaUrl": "https://x/second.png" } }),
    )
    .await;

    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(&server, &temp_dir);
    config.poll = effect_gen::PollConfig {
        max_attempts: 60,
        interval: Duration::from_millis(50),
    };
    let orchestrator = effect_gen::LifecycleOrchestrator::new(config).unwrap();
    let mut rx = orchestrator.subscribe();
    let session = session_with_asset().await;

    let first = orchestrator.generate(&session);
    let second = async {
        tokio::time::sleep(Duration::from_millis(120)).await;
        orchestrator.generate(&session).await
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, Err(Error::Superseded)));
    let media = second.unwrap();
    assert_eq!(media.url, "https://x/second.png");
    assert_eq!(session.last_media().await, Some(media));
    assert_eq!(session.generation().await, 2);

    let events = drain_events(&mut rx);
    assert!(error_messages(&events).is_empty());
    assert_eq!(labels(&events).last(), Some(&ProgressLabel::Complete));
}

struct FixedUploader {
    asset: AssetReference,
    uploaded: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl AssetUploader for FixedUploader {
    async fn upload(&self, file: &LocalFile) -> effect_gen::Result<AssetReference> {
        self.uploaded.lock().unwrap().push(file.name.clone());
        Ok(self.asset.clone())
    }
}

#[tokio::test]
async fn injected_uploader_replaces_signed_url_upload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-emd-upload-url"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let uploaded = Arc::new(Mutex::new(Vec::new()));
    let (orchestrator, _temp_dir) = create_test_orchestrator(&server);
    let orchestrator = orchestrator.with_uploader(Arc::new(FixedUploader {
        asset: AssetReference::new(INPUT_URL),
        uploaded: uploaded.clone(),
    }));
    let session = Session::new();

    let file = LocalFile::new("face.jpg", "image/jpeg", vec![0u8; 16]);
    let asset = orchestrator.upload(&session, file).await.unwrap();

    assert_eq!(asset, AssetReference::new(INPUT_URL));
    assert_eq!(session.current_asset().await, Some(asset));
    assert_eq!(*uploaded.lock().unwrap(), vec!["face.jpg"]);
}
