//! Shared data model for parameter health history.

use serde::{Deserialize, Serialize};

/// All timestamps on the query surface are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Stable, unique identifier of a monitored parameter.
pub type ParamId = String;

/// Id of the tag written on a history entry once a notification was sent for it.
pub const TAG_NOTIFIED: &str = "notified";

/// Current epoch time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Health status
// ---------------------------------------------------------------------------

/// Live health status reported by a parameter.
///
/// Variants are ordered by severity, so the worst of a set of statuses is
/// its maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unstable,
    Broken,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Unstable => "Unstable",
            Self::Broken => "Broken",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A result recorded in history.
///
/// Mirrors [`HealthStatus`] plus `Unknown`, which is only ever recorded when
/// a status update itself failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryResult {
    Healthy,
    Unstable,
    Broken,
    #[serde(rename = "unknown")]
    Unknown,
}

impl HistoryResult {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<HealthStatus> for HistoryResult {
    fn from(status: HealthStatus) -> Self {
        match status {
            HealthStatus::Healthy => Self::Healthy,
            HealthStatus::Unstable => Self::Unstable,
            HealthStatus::Broken => Self::Broken,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Severity attached to an outgoing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `(severity, title, description)` triple handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: description.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// History entries
// ---------------------------------------------------------------------------

/// Metadata attached to the head of a parameter's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    /// Opaque payload. For [`TAG_NOTIFIED`] this is the sent [`Notification`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Tag {
    /// Create a tag without payload.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
        }
    }

    /// The tag recording that `notification` was sent for an entry.
    pub fn notified(notification: &Notification) -> Self {
        Self {
            id: TAG_NOTIFIED.to_string(),
            data: serde_json::to_value(notification).ok(),
        }
    }

    pub fn is_notified(&self) -> bool {
        self.id == TAG_NOTIFIED
    }

    /// Decode the notification stored in a `notified` tag.
    ///
    /// Returns `None` for other tags or a payload that is not a notification.
    pub fn notification(&self) -> Option<Notification> {
        if !self.is_notified() {
            return None;
        }
        self.data
            .clone()
            .and_then(|data| serde_json::from_value(data).ok())
    }
}

/// A single timestamped result in a parameter's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub result: HistoryResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

impl HistoryEntry {
    pub fn new(result: HistoryResult, timestamp: i64) -> Self {
        Self {
            timestamp,
            result,
            tag: None,
        }
    }

    /// Entry recording a failed status update.
    pub fn unknown(timestamp: i64) -> Self {
        Self::new(HistoryResult::Unknown, timestamp)
    }

    pub fn is_notified(&self) -> bool {
        self.tag.as_ref().is_some_and(Tag::is_notified)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worst_status_is_the_maximum() {
        let statuses = [HealthStatus::Unstable, HealthStatus::Broken, HealthStatus::Healthy];
        assert_eq!(statuses.iter().max(), Some(&HealthStatus::Broken));
        assert!(HealthStatus::Healthy < HealthStatus::Unstable);
    }

    #[test]
    fn history_result_serializes_unknown_in_lowercase() {
        let json = serde_json::to_value(HistoryResult::Unknown).unwrap();
        assert_eq!(json, "unknown");
        let json = serde_json::to_value(HistoryResult::Broken).unwrap();
        assert_eq!(json, "Broken");
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Severity::Success).unwrap(), "success");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }

    #[test]
    fn notified_tag_carries_the_sent_notification() {
        let sent = Notification::new(Severity::Error, "Broken: Node", "node is down");
        let tag = Tag::notified(&sent);

        assert!(tag.is_notified());
        assert_eq!(tag.notification(), Some(sent));
    }

    #[test]
    fn other_tags_have_no_notification() {
        let tag = Tag {
            id: "custom".into(),
            data: Some(serde_json::json!({"severity": "error"})),
        };
        assert!(!tag.is_notified());
        assert!(tag.notification().is_none());
    }

    #[test]
    fn entry_without_tag_is_not_notified() {
        let entry = HistoryEntry::new(HistoryResult::Broken, 10);
        assert!(!entry.is_notified());
        assert!(HistoryEntry::unknown(10).result.is_unknown());
    }
}
