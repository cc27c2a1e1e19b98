use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use healthwatch_core::CoreError;
use healthwatch_events::{DispatchError, NotificationFailure};
use serde_json::json;

/// Error type of the monitor service.
///
/// Wraps [`CoreError`] for domain errors and carries the notification
/// failures of an update cycle. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A domain-level error from `healthwatch_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Every notification that failed during one update, across all
    /// parameters.
    #[error("{} notification(s) failed during health update", .0.len())]
    Notifications(Vec<NotificationFailure>),
}

/// Convenience alias for handler and orchestrator return values.
pub type MonitorResult<T> = Result<T, MonitorError>;

impl From<DispatchError> for MonitorError {
    fn from(err: DispatchError) -> Self {
        MonitorError::Notifications(err.failures)
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            MonitorError::Core(core) => match core {
                CoreError::ParamNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Parameter {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
            },
            MonitorError::Notifications(failures) => {
                tracing::error!(count = failures.len(), "Notification failures");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFICATION_ERROR",
                    self.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
