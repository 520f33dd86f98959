//! Account creation.

use std::sync::Arc;

use async_trait::async_trait;
use newsdesk_auth::{AuthProvider, Session, SignUp};
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use newsdesk_db::Value;

use super::{contact_email, full_name};
use crate::controller::{auth_failure_message, FormHandler};
use crate::record::FormRecord;
use crate::validation::{FieldRule, RuleKind, Schema};

/// Signs a new user up. The returned session may still need email
/// confirmation, so it is not installed as the current session.
pub struct SignupForm {
    auth: Arc<dyn AuthProvider>,
    schema: Schema,
}

impl SignupForm {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        let schema = Schema::new()
            .field("fullName", full_name())
            .field(
                "email",
                contact_email().error_message(RuleKind::Required, "Email is required"),
            )
            .field(
                "password",
                FieldRule::new()
                    .required()
                    .min_length(8)
                    .error_message(RuleKind::Required, "Password is required")
                    .error_message(RuleKind::MinLength, "Password must be at least 8 characters"),
            )
            .field(
                "confirmPassword",
                FieldRule::new().required().custom(|value, record| {
                    if value.as_str() == Some(record.text("password")) {
                        Ok(())
                    } else {
                        Err("Passwords do not match".to_string())
                    }
                }),
            )
            .field(
                "agreeTerms",
                FieldRule::new().custom(|value, _| match value {
                    Value::Bool(true) => Ok(()),
                    _ => Err("You must agree to the terms of service".to_string()),
                }),
            );
        Self { auth, schema }
    }
}

#[async_trait]
impl FormHandler for SignupForm {
    type Output = Session;

    fn name(&self) -> &'static str {
        "signup"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        FormRecord::new()
            .with("fullName", "")
            .with("email", "")
            .with("password", "")
            .with("confirmPassword", "")
            .with("agreeTerms", false)
    }

    fn consent_fields(&self) -> &[&'static str] {
        &["agreeTerms"]
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<Session> {
        let data = SignUp {
            email: record.text("email").trim().to_string(),
            password: record.text("password").to_string(),
            full_name: record.text("fullName").trim().to_string(),
        };
        let session = self.auth.sign_up(&data).await?;
        tracing::info!(user = %session.user_id, "account created");
        Ok(session)
    }

    fn failure_message(&self, error: &NewsdeskError) -> String {
        auth_failure_message(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate;
    use newsdesk_test::MemoryAuthProvider;

    fn form() -> SignupForm {
        SignupForm::new(Arc::new(MemoryAuthProvider::new()))
    }

    #[test]
    fn test_password_mismatch() {
        let form = form();
        let record = form
            .initial()
            .with("fullName", "Sam Reporter")
            .with("email", "sam@example.com")
            .with("password", "longenough1")
            .with("confirmPassword", "different")
            .with("agreeTerms", true);
        let errors = validate(form.schema(), &record).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.message("confirmPassword").as_deref(),
            Some("Passwords do not match")
        );
        assert!(!errors.contains("password"));
    }

    #[test]
    fn test_terms_rule() {
        let form = form();
        let record = form
            .initial()
            .with("fullName", "S")
            .with("email", "sam@example.com")
            .with("password", "longenough1")
            .with("confirmPassword", "longenough1");
        let errors = validate(form.schema(), &record).unwrap_err();
        assert_eq!(
            errors.message("agreeTerms").as_deref(),
            Some("You must agree to the terms of service")
        );
        assert_eq!(
            errors.message("fullName").as_deref(),
            Some("Name must be at least 2 characters")
        );
    }

    #[tokio::test]
    async fn test_duplicate_email_message() {
        let form = form();
        let record = form
            .initial()
            .with("fullName", "Sam")
            .with("email", "sam@example.com")
            .with("password", "longenough1");
        form.persist(&record).await.unwrap();
        let err = form.persist(&record).await.unwrap_err();
        assert_eq!(form.failure_message(&err), "This email is already registered");
    }
}
