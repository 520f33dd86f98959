//! The advertisement request form.

use std::sync::Arc;

use async_trait::async_trait;
use newsdesk_auth::SessionStore;
use newsdesk_core::NewsdeskResult;
use newsdesk_db::{AdRequest, AdStatus, RequestService, Row};
use newsdesk_notify::{DetachedNotification, Notifier};

use super::{contact_email, contact_phone, institution_name};
use crate::controller::FormHandler;
use crate::record::FormRecord;
use crate::validation::{FieldRule, RuleKind, Schema};

/// Values offered in the `adTypes` checkbox group.
pub const AD_TYPES: [&str; 6] = ["job", "business", "tender", "service", "sponsored", "launch"];

/// Collects an ad request and alerts the ad desk through a webhook.
pub struct AdRequestForm {
    requests: RequestService,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    schema: Schema,
}

impl AdRequestForm {
    pub fn new(requests: RequestService, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        let schema = Schema::new()
            .field("institutionName", institution_name())
            .field(
                "sector",
                FieldRule::new()
                    .required()
                    .error_message(RuleKind::Required, "Sector is required"),
            )
            .field(
                "adTypes",
                FieldRule::new()
                    .min_items(1)
                    .error_message(RuleKind::MinItems, "Please select at least one ad type"),
            )
            .field(
                "adDetails",
                FieldRule::new()
                    .required()
                    .min_length(10)
                    .error_message(RuleKind::MinLength, "Details must be at least 10 characters"),
            )
            .field("email", contact_email())
            .field("phone", contact_phone());
        Self {
            requests,
            session,
            notifier,
            schema,
        }
    }

    /// The entity a valid draft turns into.
    pub fn request_from(&self, record: &FormRecord) -> AdRequest {
        AdRequest {
            id: None,
            user_id: self.session.user_id(),
            institution_name: record.text("institutionName").to_string(),
            sector: record.text("sector").to_string(),
            ad_types: record.strings("adTypes"),
            ad_details: record.text("adDetails").to_string(),
            email: record.text("email").to_string(),
            phone: record.optional_text("phone"),
            boost_ad: record.is_checked("boostAd"),
            status: AdStatus::Pending,
            admin_notes: None,
            start_date: None,
            end_date: None,
            created_at: None,
        }
    }
}

#[async_trait]
impl FormHandler for AdRequestForm {
    type Output = AdRequest;

    fn name(&self) -> &'static str {
        "ad_request"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        FormRecord::new()
            .with("institutionName", "")
            .with("sector", "")
            .with("adTypes", Vec::<String>::new())
            .with("adDetails", "")
            .with("email", "")
            .with("phone", "")
            .with("boostAd", false)
            .with("agreeTerms", false)
    }

    fn consent_fields(&self) -> &[&'static str] {
        &["agreeTerms"]
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<AdRequest> {
        self.requests.create(&self.request_from(record)).await
    }

    /// The webhook gets the submitted fields, never review state.
    fn notification(&self, record: &FormRecord, _output: &AdRequest) -> Option<DetachedNotification> {
        let request = self.request_from(record);
        let payload = Row::new()
            .with("user_id", request.user_id)
            .with("institution_name", request.institution_name)
            .with("sector", request.sector)
            .with("ad_types", request.ad_types)
            .with("ad_details", request.ad_details)
            .with("email", request.email)
            .with("phone", request.phone)
            .with("boost_ad", request.boost_ad);
        Some(DetachedNotification::new(
            Arc::clone(&self.notifier),
            Vec::new(),
            payload,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use newsdesk_db::MemoryGateway;
    use newsdesk_notify::StoreNotifier;

    fn form() -> AdRequestForm {
        let gateway = Arc::new(MemoryGateway::new());
        let session = SessionStore::anonymous();
        AdRequestForm::new(
            RequestService::new(gateway.clone(), session.clone()),
            session,
            Arc::new(StoreNotifier::new(gateway)),
        )
    }

    #[test]
    fn test_short_details_and_no_ad_types() {
        let form = form();
        let record = form
            .initial()
            .with("institutionName", "Acme")
            .with("sector", "media")
            .with("email", "a@b.com")
            .with("adDetails", "short");
        let errors = validate(form.schema(), &record).unwrap_err();
        assert_eq!(
            errors.message("adTypes").as_deref(),
            Some("Please select at least one ad type")
        );
        assert_eq!(
            errors.message("adDetails").as_deref(),
            Some("Details must be at least 10 characters")
        );
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_request_from_normalizes_fields() {
        let form = form();
        let mut record = form
            .initial()
            .with("institutionName", "Acme")
            .with("boostAd", true);
        record.toggle_choice("adTypes", "tender", true);
        let request = form.request_from(&record);
        assert_eq!(request.user_id, None);
        assert_eq!(request.phone, None);
        assert_eq!(request.ad_types, vec!["tender".to_string()]);
        assert!(request.boost_ad);
    }
}
