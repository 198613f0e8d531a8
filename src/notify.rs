//! Staff notifications
//!
//! Live notifications go out over NATS; a bounded in-memory history ring
//! lets newly connecting staff displays catch up on what they missed.
//! Both are best-effort: a failed publish is logged and dropped.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many notifications the history ring retains. Oldest evicted first.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffNotification {
    pub message: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Notifier {
    nats: Option<async_nats::Client>,
    subject: String,
    recent: Arc<Mutex<VecDeque<StaffNotification>>>,
}

impl Notifier {
    pub fn new(nats: Option<async_nats::Client>, subject: impl Into<String>) -> Self {
        Self {
            nats,
            subject: subject.into(),
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY))),
        }
    }

    /// Records the notification in history and publishes it to connected
    /// staff clients. Never fails: publish errors are logged and dropped.
    pub async fn broadcast(&self, message: impl Into<String>) {
        let note = StaffNotification { message: message.into(), sent_at: Utc::now() };
        self.remember(note.clone());

        let Some(client) = &self.nats else {
            tracing::debug!("no NATS client configured, staff notification kept in history only");
            return;
        };
        match serde_json::to_vec(&note) {
            Ok(payload) => {
                if let Err(e) = client.publish(self.subject.clone(), payload.into()).await {
                    tracing::warn!(error = %e, "failed to publish staff notification");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode staff notification"),
        }
    }

    /// Recent notifications, oldest first.
    pub fn recent(&self) -> Vec<StaffNotification> {
        let recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.iter().cloned().collect()
    }

    fn remember(&self, note: StaffNotification) {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        if recent.len() == HISTORY_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(note);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_records_broadcasts() {
        let notifier = Notifier::new(None, "test.subject");
        notifier.broadcast("first").await;
        notifier.broadcast("second").await;

        let recent = notifier.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "first");
        assert_eq!(recent[1].message, "second");
    }

    #[tokio::test]
    async fn test_history_evicts_oldest_beyond_capacity() {
        let notifier = Notifier::new(None, "test.subject");
        for i in 0..15 {
            notifier.broadcast(format!("note {i}")).await;
        }

        let recent = notifier.recent();
        assert_eq!(recent.len(), HISTORY_CAPACITY);
        assert_eq!(recent[0].message, "note 5");
        assert_eq!(recent[9].message, "note 14");
    }

    #[test]
    fn test_notification_wire_shape() {
        let note = StaffNotification { message: "A customer just bought 3 books!".into(), sent_at: Utc::now() };
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["message"], serde_json::json!("A customer just bought 3 books!"));
        assert!(json.get("sentAt").is_some());
    }
}
