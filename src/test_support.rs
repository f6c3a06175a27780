//! Shared fixtures for handler tests.

use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use axum::Router;
use wiremock::{MockServer, Request};

use crate::config::Config;
use crate::vonage::client::VonageClient;
use crate::AppState;

pub const SERVICE_NUMBER: &str = "12995550999";
pub const PRIVATE_KEY: &[u8] = include_bytes!("../tests/fixtures/private.key");

pub fn config() -> Config {
    let mut config = Config::default();
    config.vonage.api_region = "api.example.test".into();
    config.vonage.application_id = "test-app".into();
    config.call.service_phone_number = SERVICE_NUMBER.into();
    config
}

/// App state whose Voice API client talks to `vonage_base_url`.
pub fn state(vonage_base_url: &str, config: Config) -> AppState {
    AppState {
        config,
        vonage: Arc::new(
            VonageClient::with_key(vonage_base_url, "test-app", PRIVATE_KEY).unwrap(),
        ),
    }
}

pub fn router(vonage_base_url: &str, config: Config) -> Router {
    crate::router(state(vonage_base_url, config))
}

pub async fn body_text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Poll until the mock has seen `count` requests. Remote calls are spawned
/// after the handler replies, so they land some time after the response.
pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let requests = server.received_requests().await.unwrap();
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for Voice API requests")
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_matching(&self, needles: &[&str]) -> usize {
        self.contents()
            .lines()
            .filter(|line| needles.iter().all(|n| line.contains(n)))
            .count()
    }

    /// Wait until some line contains every needle.
    pub async fn wait_for(&self, needles: &[&str]) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.lines_matching(needles) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no log line with {needles:?} in:\n{}", self.contents()));
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing events into a buffer until the guard drops.
/// Tests using it run on the current-thread runtime, so spawned tasks log here too.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (logs, tracing::subscriber::set_default(subscriber))
}
