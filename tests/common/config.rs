//! Test configuration helpers pointing the library at a mock server

use effect_gen::{Config, LifecycleOrchestrator, PollConfig};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Poll policy with the production budget but a 1 ms interval
pub fn fast_poll(max_attempts: u32) -> PollConfig {
    PollConfig {
        max_attempts,
        interval: Duration::from_millis(1),
    }
}

/// Configuration targeting `server`, exporting into `download_dir`
pub fn test_config(server: &MockServer, download_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.content_base_url = format!("{}/contents", server.uri());
    config.poll = fast_poll(60);
    config.export.download_dir = download_dir.path().to_path_buf();
    // keep the terminal fallback from launching a real browser
    config.export.open_command = Some("/bin/true".into());
    config
}

/// Orchestrator plus the temp dir that must outlive it
pub fn create_test_orchestrator(server: &MockServer) -> (LifecycleOrchestrator, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = test_config(server, &temp_dir);
    let orchestrator = LifecycleOrchestrator::new(config).expect("Failed to create orchestrator");
    (orchestrator, temp_dir)
}
