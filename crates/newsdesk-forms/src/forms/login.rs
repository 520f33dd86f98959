//! Sign-in form.
//!
//! Checks the email and password locally, then asks the auth provider. The
//! returned session replaces the shared [`SessionStore`] contents, so later
//! backend calls carry the user's token.

use std::sync::Arc;

use async_trait::async_trait;
use newsdesk_auth::{AuthProvider, Session, SessionStore};
use newsdesk_core::{NewsdeskError, NewsdeskResult};

use super::contact_email;
use crate::controller::{auth_failure_message, FormHandler};
use crate::record::FormRecord;
use crate::validation::{FieldRule, RuleKind, Schema};

/// Email and password sign-in. A successful sign-in becomes the current
/// session.
pub struct LoginForm {
    auth: Arc<dyn AuthProvider>,
    session: SessionStore,
    schema: Schema,
}

impl LoginForm {
    pub fn new(auth: Arc<dyn AuthProvider>, session: SessionStore) -> Self {
        let schema = Schema::new()
            .field(
                "email",
                contact_email().error_message(RuleKind::Required, "Email is required"),
            )
            .field(
                "password",
                FieldRule::new()
                    .required()
                    .error_message(RuleKind::Required, "Password is required"),
            );
        Self {
            auth,
            session,
            schema,
        }
    }
}

#[async_trait]
impl FormHandler for LoginForm {
    type Output = Session;

    fn name(&self) -> &'static str {
        "login"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        FormRecord::new().with("email", "").with("password", "")
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<Session> {
        let session = self
            .auth
            .sign_in(record.text("email").trim(), record.text("password"))
            .await?;
        self.session.set(Some(session.clone()));
        tracing::info!(user = %session.user_id, role = %session.role, "signed in");
        Ok(session)
    }

    fn failure_message(&self, error: &NewsdeskError) -> String {
        auth_failure_message(error)
    }
}
