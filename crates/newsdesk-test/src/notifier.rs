//! A [`Notifier`] that captures what it was asked to send.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use newsdesk_db::Row;
use newsdesk_notify::Notifier;
use tokio::sync::watch;

/// One captured delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct SentNotification {
    pub targets: Vec<String>,
    pub payload: Row,
}

/// Records every `notify` call. Clones share the same log.
///
/// Deliveries are captured even when a failure is configured, since the
/// call itself happened.
#[derive(Clone)]
pub struct RecordingNotifier {
    name: String,
    sent: Arc<watch::Sender<Vec<SentNotification>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl RecordingNotifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Arc::new(watch::channel(Vec::new()).0),
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Makes every later call fail with a notification error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().expect("RecordingNotifier lock poisoned") = Some(message.into());
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.sent.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Waits until at least `n` deliveries were attempted.
    pub async fn wait_for(&self, n: usize) {
        let mut rx = self.sent.subscribe();
        let _ = rx.wait_for(|sent| sent.len() >= n).await;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, targets: &[String], payload: &Row) -> NewsdeskResult<()> {
        self.sent.send_modify(|sent| {
            sent.push(SentNotification {
                targets: targets.to_vec(),
                payload: payload.clone(),
            });
        });
        let failure = self
            .failure
            .lock()
            .expect("RecordingNotifier lock poisoned")
            .clone();
        failure.map_or(Ok(()), |message| Err(NewsdeskError::Notification(message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_even_when_failing() {
        let notifier = RecordingNotifier::new("notify-admin");
        notifier
            .notify(&[], &Row::new().with("email", "a@b.com"))
            .await
            .unwrap();
        notifier.fail_with("function offline");
        let err = notifier.notify(&[], &Row::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Notification failed: function offline");

        let shared = notifier.clone();
        assert_eq!(shared.len(), 2);
        assert_eq!(shared.sent()[0].payload.get_str("email"), Some("a@b.com"));
    }
}
