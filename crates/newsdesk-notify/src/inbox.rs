//! A user's notification inbox.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use newsdesk_core::{NewsdeskResult, Translator};
use newsdesk_db::entities::from_row;
use newsdesk_db::{Collection, Notification, NotificationKind, PersistenceGateway, Q, Query, Row};

/// How many notifications the inbox loads.
pub const INBOX_LIMIT: usize = 50;

/// A notification prepared for display in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxItem {
    pub id: Option<String>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub time_ago: String,
}

/// Reads and updates notifications addressed to users.
#[derive(Clone)]
pub struct Inbox {
    gateway: Arc<dyn PersistenceGateway>,
}

impl Inbox {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// The newest [`INBOX_LIMIT`] notifications for `user_id`.
    pub async fn list(&self, user_id: &str) -> NewsdeskResult<Vec<Notification>> {
        let query = Query::all()
            .filter(Q::eq("user_id", user_id))
            .newest_first()
            .limit(INBOX_LIMIT);
        self.gateway
            .select(Collection::Notifications, &query)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    pub async fn mark_read(&self, id: &str) -> NewsdeskResult<()> {
        self.gateway
            .update(
                Collection::Notifications,
                &Q::eq("id", id),
                Row::new().with("read", true),
            )
            .await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> NewsdeskResult<()> {
        let unread = Q::eq("user_id", user_id) & Q::eq("read", false);
        self.gateway
            .update(
                Collection::Notifications,
                &unread,
                Row::new().with("read", true),
            )
            .await
    }

    pub async fn delete(&self, id: &str) -> NewsdeskResult<()> {
        self.gateway
            .delete(Collection::Notifications, &Q::eq("id", id))
            .await
    }

    pub async fn unread_count(&self, user_id: &str) -> NewsdeskResult<usize> {
        let unread = Q::eq("user_id", user_id) & Q::eq("read", false);
        self.gateway
            .count(Collection::Notifications, Some(&unread))
            .await
    }

    /// Loads the inbox and renders it in the translator's language.
    pub async fn display(
        &self,
        user_id: &str,
        translator: &dyn Translator,
    ) -> NewsdeskResult<Vec<InboxItem>> {
        let now = Utc::now();
        Ok(self
            .list(user_id)
            .await?
            .iter()
            .map(|n| render(n, translator, now))
            .collect())
    }
}

fn render(notification: &Notification, translator: &dyn Translator, now: DateTime<Utc>) -> InboxItem {
    let language = translator.language();
    InboxItem {
        id: notification.id.clone(),
        title: notification.title_in(language).to_string(),
        message: notification.message_in(language).to_string(),
        kind: notification.kind,
        read: notification.read,
        time_ago: notification
            .created_at
            .map(|at| time_ago(at, now, translator))
            .unwrap_or_default(),
    }
}

/// Relative age of a timestamp: "Just now", minutes, hours, days, then a date.
pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>, translator: &dyn Translator) -> String {
    let seconds = (now - at).num_seconds().max(0).unsigned_abs();
    match seconds {
        0..=59 => translator.gettext("Just now"),
        60..=3_599 => translator.gettext_n("{n} min ago", seconds / 60),
        3_600..=86_399 => translator.gettext_n("{n} hours ago", seconds / 3_600),
        86_400..=604_799 => translator.gettext_n("{n} days ago", seconds / 86_400),
        _ => match translator.language() {
            "en" => at.format("%-m/%-d/%Y").to_string(),
            _ => at.format("%d/%m/%Y").to_string(),
        },
    }
}
