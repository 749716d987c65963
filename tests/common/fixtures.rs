//! Mock endpoint fixtures for the remote generation service

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// User id the default configuration sends
pub const USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";

/// Status endpoint path for `job_id` on the image pipeline
pub fn status_path(job_id: &str) -> String {
    format!("/image-gen/{}/{}/status", USER_ID, job_id)
}

/// Accept one submission and answer with `job_id`
pub async fn mount_submit(server: &MockServer, job_id: &str) {
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "jobId": job_id })))
        .expect(1)
        .mount(server)
        .await;
}

/// Answer the next `times` status requests with `body`
///
/// Mount in the order the responses should be served.
pub async fn mount_status_times(server: &MockServer, job_id: &str, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(status_path(job_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

/// Answer every remaining status request with `body`
pub async fn mount_status(server: &MockServer, job_id: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(status_path(job_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serve media bytes at `media_path` with the given content type
pub async fn mount_media(server: &MockServer, media_path: &str, content_type: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(media_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

/// Fail every request for `media_path` with `status`
pub async fn mount_media_failure(server: &MockServer, media_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(media_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
