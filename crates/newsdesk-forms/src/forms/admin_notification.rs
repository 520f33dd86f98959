//! The admin announcement form.
//!
//! Sends one notification row to every recipient. Unlike the request forms,
//! the store write is the primary action here: the controller awaits it and
//! a failure is shown to the admin.

use async_trait::async_trait;
use newsdesk_auth::SessionStore;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use newsdesk_db::{NotificationKind, ProfileService, Row};
use newsdesk_notify::{Notifier, StoreNotifier};

use crate::controller::FormHandler;
use crate::record::FormRecord;
use crate::validation::{FieldRule, RuleKind, Schema};

const NO_RECIPIENTS: &str = "Please select at least one user";

/// Who an announcement goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    /// Every profile.
    All,
    /// The ids picked in the `selectedUsers` checkbox group.
    Selected(Vec<String>),
}

impl Recipients {
    /// Reads `targetUsers` and `selectedUsers` from a draft.
    pub fn from_record(record: &FormRecord) -> Self {
        match record.text("targetUsers") {
            "selected" => Self::Selected(record.strings("selectedUsers")),
            _ => Self::All,
        }
    }
}

pub struct AdminNotificationForm {
    store: StoreNotifier,
    profiles: ProfileService,
    session: SessionStore,
    schema: Schema,
}

impl AdminNotificationForm {
    pub fn new(store: StoreNotifier, profiles: ProfileService, session: SessionStore) -> Self {
        let kinds = NotificationKind::ALL.map(NotificationKind::as_str);
        let schema = Schema::new()
            .field(
                "targetUsers",
                FieldRule::new().required().one_of(["all", "selected"]),
            )
            .field(
                "title",
                FieldRule::new()
                    .required()
                    .error_message(RuleKind::Required, "Title is required"),
            )
            .field(
                "message",
                FieldRule::new()
                    .required()
                    .error_message(RuleKind::Required, "Message is required"),
            )
            .field("type", FieldRule::new().required().one_of(kinds));
        Self {
            store,
            profiles,
            session,
            schema,
        }
    }

    /// The row every recipient gets, without `user_id`.
    pub fn payload(record: &FormRecord) -> Row {
        Row::new()
            .with("title", record.text("title"))
            .with("title_ar", record.optional_text("titleAr"))
            .with("title_fr", record.optional_text("titleFr"))
            .with("message", record.text("message"))
            .with("message_ar", record.optional_text("messageAr"))
            .with("message_fr", record.optional_text("messageFr"))
            .with("type", record.text("type"))
            .with("related_type", "announcement")
            .with("read", false)
    }

    async fn targets(&self, record: &FormRecord) -> NewsdeskResult<Vec<String>> {
        match Recipients::from_record(record) {
            Recipients::All => self.profiles.all_ids().await,
            Recipients::Selected(ids) => Ok(ids),
        }
    }
}

#[async_trait]
impl FormHandler for AdminNotificationForm {
    /// How many users were notified.
    type Output = usize;

    fn name(&self) -> &'static str {
        "admin_notification"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        FormRecord::new()
            .with("targetUsers", "all")
            .with("selectedUsers", Vec::<String>::new())
            .with("title", "")
            .with("titleAr", "")
            .with("titleFr", "")
            .with("message", "")
            .with("messageAr", "")
            .with("messageFr", "")
            .with("type", NotificationKind::Info.as_str())
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<usize> {
        let admin = self.session.require_admin()?;
        let targets = self.targets(record).await?;
        if targets.is_empty() {
            return Err(NewsdeskError::BadRequest(NO_RECIPIENTS.to_string()));
        }
        self.store.notify(&targets, &Self::payload(record)).await?;
        tracing::info!(
            recipients = targets.len(),
            by = %admin.user_id,
            "announcement sent"
        );
        Ok(targets.len())
    }

    fn failure_message(&self, error: &NewsdeskError) -> String {
        match error {
            NewsdeskError::BadRequest(_) => NO_RECIPIENTS.to_string(),
            _ => "Error sending notification".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipients_from_record() {
        let record = FormRecord::new().with("targetUsers", "all");
        assert_eq!(Recipients::from_record(&record), Recipients::All);

        let mut record = FormRecord::new().with("targetUsers", "selected");
        record.toggle_choice("selectedUsers", "u2", true);
        assert_eq!(
            Recipients::from_record(&record),
            Recipients::Selected(vec!["u2".to_string()])
        );
    }

    #[test]
    fn test_payload_nulls_missing_translations() {
        let record = FormRecord::new()
            .with("title", "Maintenance")
            .with("titleFr", "Maintenance prévue")
            .with("titleAr", "  ")
            .with("message", "Back at noon")
            .with("type", "warning");
        let row = AdminNotificationForm::payload(&record);
        assert_eq!(row.get_str("title_fr"), Some("Maintenance prévue"));
        assert_eq!(row.get("title_ar"), Some(&newsdesk_db::Value::Null));
        assert_eq!(row.get_str("related_type"), Some("announcement"));
        assert!(!row.contains("user_id"));
    }
}
