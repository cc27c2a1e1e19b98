#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use healthwatch_core::{BoxError, HealthParam, HealthStatus, MonitorConfig, Notification};
use healthwatch_events::{NotificationSink, NotifyError};
use healthwatch_monitor::routes::{self, AppState};
use healthwatch_monitor::HealthOrchestrator;
use http_body_util::BodyExt;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// A parameter whose status and failure mode are set by the test.
pub struct ScriptedParam {
    id: String,
    status: Mutex<HealthStatus>,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl ScriptedParam {
    pub fn new(id: &str, status: HealthStatus) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            status: Mutex::new(status),
            failing: AtomicBool::new(false),
            delay: None,
        })
    }

    pub fn failing(id: &str) -> Arc<Self> {
        let param = Self::new(id, HealthStatus::Healthy);
        param.set_failing(true);
        param
    }

    pub fn slow(id: &str, status: HealthStatus, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            status: Mutex::new(status),
            failing: AtomicBool::new(false),
            delay: Some(delay),
        })
    }

    pub fn set_status(&self, status: HealthStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl HealthParam for ScriptedParam {
    fn id(&self) -> &str {
        &self.id
    }

    async fn title(&self) -> String {
        format!("Param {}", self.id)
    }

    async fn description(&self) -> String {
        format!("Scripted parameter {}", self.id)
    }

    async fn details(&self) -> Option<String> {
        match *self.status.lock().unwrap() {
            HealthStatus::Healthy => None,
            status => Some(format!("{} is {status}", self.id)),
        }
    }

    async fn update_status(&self) -> Result<(), BoxError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(format!("{} endpoint unreachable", self.id).into());
        }
        Ok(())
    }

    async fn health_status(&self) -> HealthStatus {
        *self.status.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn titles(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.title.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected("sink offline".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn orchestrator_with(sink: Arc<dyn NotificationSink>) -> Arc<HealthOrchestrator> {
    Arc::new(HealthOrchestrator::new(&MonitorConfig::default(), sink).unwrap())
}

/// Build the application router the binary serves.
pub fn build_test_app(orchestrator: Arc<HealthOrchestrator>) -> Router {
    routes::app(AppState { orchestrator }, Duration::from_secs(30))
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
