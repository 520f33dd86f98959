//! Notification fan-out.
//!
//! A [`Notifier`] delivers one payload to a set of targets. Two variants
//! exist:
//!
//! - [`StoreNotifier`] writes one notification row per target user.
//! - [`WebhookNotifier`] makes a single POST to a hosted function, which
//!   decides who to alert.
//!
//! Secondary notifications are wrapped in a [`DetachedNotification`] and
//! spawned. The caller never awaits them, and a failure only produces a
//! `warn!` log line. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsdesk_core::{NewsdeskError, NewsdeskResult, Settings};
use newsdesk_db::{Collection, PersistenceGateway, Row};
use reqwest::Client;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Delivers a payload to a set of targets.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Delivers `payload` to every id in `targets`.
    async fn notify(&self, targets: &[String], payload: &Row) -> NewsdeskResult<()>;
}

/// Inserts one row per target into the notifications collection.
///
/// Each row is the payload plus a `user_id` column. Gateway errors are
/// returned unchanged, so a caller that awaits this as its primary action
/// sees ordinary infrastructure errors.
#[derive(Clone)]
pub struct StoreNotifier {
    gateway: Arc<dyn PersistenceGateway>,
}

impl StoreNotifier {
    /// Creates a notifier writing through `gateway`.
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Notifier for StoreNotifier {
    fn name(&self) -> &str {
        "store"
    }

    async fn notify(&self, targets: &[String], payload: &Row) -> NewsdeskResult<()> {
        if targets.is_empty() {
            return Ok(());
        }
        let rows: Vec<Row> = targets
            .iter()
            .map(|user_id| payload.clone().with("user_id", user_id.as_str()))
            .collect();
        let stored = self.gateway.insert(Collection::Notifications, rows).await?;
        tracing::debug!(count = stored.len(), "notifications stored");
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct WebhookErrorBody {
    error: Option<String>,
}

/// Posts the payload as JSON to a hosted function.
///
/// Targets are ignored: the function resolves its own recipients.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    function: String,
    url: String,
    anon_key: String,
}

impl WebhookNotifier {
    /// Creates a notifier for the hosted function `function`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(settings: &Settings, function: &str) -> NewsdeskResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.notify.timeout_ms))
            .build()
            .map_err(|e| NewsdeskError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            function: function.to_string(),
            url: settings.function_url(function),
            anon_key: settings.backend.anon_key.clone(),
        })
    }

    /// The endpoint this notifier posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        &self.function
    }

    async fn notify(&self, _targets: &[String], payload: &Row) -> NewsdeskResult<()> {
        let mut request = self.client.post(&self.url).json(payload);
        if !self.anon_key.is_empty() {
            request = request
                .header("apikey", &self.anon_key)
                .bearer_auth(&self.anon_key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| NewsdeskError::Notification(e.to_string()))?;
        if response.status().is_success() {
            return Ok(());
        }
        let body: WebhookErrorBody = response.json().await.unwrap_or_default();
        Err(NewsdeskError::Notification(
            body.error
                .unwrap_or_else(|| "Failed to notify admin".to_string()),
        ))
    }
}

/// A notification to send without waiting for it.
#[derive(Clone)]
pub struct DetachedNotification {
    notifier: Arc<dyn Notifier>,
    targets: Vec<String>,
    payload: Row,
}

impl DetachedNotification {
    /// Bundles a notifier with what it should send.
    pub fn new(notifier: Arc<dyn Notifier>, targets: Vec<String>, payload: Row) -> Self {
        Self {
            notifier,
            targets,
            payload,
        }
    }

    /// The payload that will be sent.
    pub const fn payload(&self) -> &Row {
        &self.payload
    }

    /// Spawns delivery on the runtime. Failures are logged and dropped.
    ///
    /// The handle is only useful to tests; callers normally drop it.
    pub fn spawn(self) -> JoinHandle<()> {
        let Self {
            notifier,
            targets,
            payload,
        } = self;
        tokio::spawn(
            async move {
                match notifier.notify(&targets, &payload).await {
                    Ok(()) => tracing::debug!(notifier = notifier.name(), "notification sent"),
                    Err(err) => tracing::warn!(
                        notifier = notifier.name(),
                        error = %err,
                        "admin notification failed"
                    ),
                }
            }
            .in_current_span(),
        )
    }
}
