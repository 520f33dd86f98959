//! The service request form (reports, dashboards, consultations).

use std::sync::Arc;

use async_trait::async_trait;
use newsdesk_auth::SessionStore;
use newsdesk_core::NewsdeskResult;
use newsdesk_db::{RequestService, Row, ServiceRequest, ServiceStatus};
use newsdesk_notify::{DetachedNotification, Notifier};

use super::{contact_email, contact_phone, institution_name};
use crate::controller::FormHandler;
use crate::record::FormRecord;
use crate::validation::{FieldRule, RuleKind, Schema};

pub const SECTORS: [&str; 2] = ["media", "economic"];
pub const SERVICE_TYPES: [&str; 3] = ["report", "dashboard", "consultation"];

pub struct ServiceRequestForm {
    requests: RequestService,
    session: SessionStore,
    notifier: Arc<dyn Notifier>,
    schema: Schema,
}

impl ServiceRequestForm {
    pub fn new(requests: RequestService, session: SessionStore, notifier: Arc<dyn Notifier>) -> Self {
        let schema = Schema::new()
            .field("institutionName", institution_name())
            .field(
                "sector",
                FieldRule::new()
                    .required()
                    .one_of(SECTORS)
                    .error_message(RuleKind::OneOf, "Please select a sector"),
            )
            .field(
                "serviceType",
                FieldRule::new()
                    .required()
                    .one_of(SERVICE_TYPES)
                    .error_message(RuleKind::OneOf, "Please select a service type"),
            )
            .field(
                "description",
                FieldRule::new()
                    .required()
                    .min_length(10)
                    .error_message(
                        RuleKind::MinLength,
                        "Description must be at least 10 characters",
                    ),
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
}

#[async_trait]
impl FormHandler for ServiceRequestForm {
    type Output = ServiceRequest;

    fn name(&self) -> &'static str {
        "service_request"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        FormRecord::new()
            .with("institutionName", "")
            .with("sector", "")
            .with("serviceType", "")
            .with("description", "")
            .with("email", "")
            .with("phone", "")
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<ServiceRequest> {
        let request = ServiceRequest {
            id: None,
            user_id: self.session.user_id(),
            institution_name: record.text("institutionName").to_string(),
            sector: record.text("sector").to_string(),
            service_type: record.text("serviceType").to_string(),
            description: record.text("description").to_string(),
            email: record.text("email").to_string(),
            phone: record.optional_text("phone"),
            status: ServiceStatus::Pending,
            admin_notes: None,
            created_at: None,
        };
        self.requests.create(&request).await
    }

    /// The webhook only gets the contact and request fields.
    fn notification(&self, _record: &FormRecord, output: &ServiceRequest) -> Option<DetachedNotification> {
        let payload = Row::new()
            .with("institution_name", output.institution_name.as_str())
            .with("sector", output.sector.as_str())
            .with("service_type", output.service_type.as_str())
            .with("description", output.description.as_str())
            .with("email", output.email.as_str())
            .with("phone", output.phone.clone());
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

    fn form() -> ServiceRequestForm {
        let gateway = Arc::new(MemoryGateway::new());
        let session = SessionStore::anonymous();
        ServiceRequestForm::new(
            RequestService::new(gateway.clone(), session.clone()),
            session,
            Arc::new(StoreNotifier::new(gateway)),
        )
    }

    #[test]
    fn test_enum_fields() {
        let form = form();
        let record = form
            .initial()
            .with("institutionName", "Acme")
            .with("sector", "sports")
            .with("description", "Quarterly market report")
            .with("email", "a@b.com")
            .with("phone", "12");
        let errors = validate(form.schema(), &record).unwrap_err();
        assert_eq!(errors.message("sector").as_deref(), Some("Please select a sector"));
        assert_eq!(errors.message("serviceType").as_deref(), Some("This field is required"));
        assert_eq!(
            errors.message("phone").as_deref(),
            Some("Please enter a valid phone number")
        );
        assert!(!errors.contains("description"));
    }

    #[tokio::test]
    async fn test_persist_stores_user_and_null_phone() {
        let gateway = Arc::new(MemoryGateway::new());
        let session = SessionStore::signed_in(newsdesk_auth::Session::new("u1", "u1@x.com"));
        let form = ServiceRequestForm::new(
            RequestService::new(gateway.clone(), session.clone()),
            session,
            Arc::new(StoreNotifier::new(gateway.clone())),
        );
        let record = form
            .initial()
            .with("institutionName", "Acme")
            .with("sector", "media")
            .with("serviceType", "report")
            .with("description", "Quarterly market report")
            .with("email", "a@b.com");
        let saved = form.persist(&record).await.unwrap();
        assert!(saved.id.is_some());
        assert_eq!(saved.user_id.as_deref(), Some("u1"));
        assert_eq!(saved.phone, None);

        let payload = form.notification(&record, &saved).unwrap();
        assert_eq!(payload.payload().get_str("service_type"), Some("report"));
        assert!(!payload.payload().contains("user_id"));
    }
}
