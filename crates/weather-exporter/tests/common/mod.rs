//! Test helpers: a scripted OpenWeatherMap stand-in served by axum.

#![allow(dead_code)]

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
    Router,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weather_exporter::Config;

pub const BERLIN_BODY: &str = r#"{"main":{"temp":18.5,"pressure":1012,"humidity":60}}"#;

/// One scripted upstream reply.
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct MockState {
    // The last response repeats once the script is exhausted.
    responses: Mutex<VecDeque<MockResponse>>,
    hits: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

/// Handle to a running mock upstream.
pub struct MockUpstream {
    pub url: String,
    state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<String> {
        self.state.last_query.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn weather(
    State(state): State<Arc<MockState>>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_query.lock().unwrap() = query;

    let response = {
        let mut responses = state.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        }
    };

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    (StatusCode::from_u16(response.status).unwrap(), response.body)
}

/// Start a mock upstream on an ephemeral local port.
pub async fn spawn_upstream(responses: Vec<MockResponse>) -> MockUpstream {
    assert!(!responses.is_empty(), "mock needs at least one response");

    let state = Arc::new(MockState {
        responses: Mutex::new(responses.into()),
        hits: AtomicUsize::new(0),
        last_query: Mutex::new(None),
    });

    let app = Router::new()
        .route("/data/2.5/weather", get(weather))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        url: format!("http://{}/data/2.5/weather", addr),
        state,
        handle,
    }
}

/// Berlin configuration pointed at `api_url` with a short request timeout.
pub fn test_config(api_url: &str) -> Config {
    Config {
        latitude: 52.52,
        longitude: 13.405,
        units: "metric".to_string(),
        location: "Berlin".to_string(),
        api_key: "test-key".to_string(),
        port: 0,
        api_url: api_url.to_string(),
        request_timeout: Duration::from_millis(300),
    }
}

/// Wait until `cond` holds, polling every 10ms, for at most `limit`.
pub async fn wait_for<F: Fn() -> bool>(cond: F, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
