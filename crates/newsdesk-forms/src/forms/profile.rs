use std::sync::Mutex;

use async_trait::async_trait;
use newsdesk_auth::SessionStore;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use newsdesk_db::{Profile, ProfileService, Row};

use super::{contact_phone, full_name};
use crate::controller::FormHandler;
use crate::record::FormRecord;
use crate::validation::Schema;

/// Edits the signed-in user's name and phone.
///
/// The draft starts from the loaded profile. After a save, the saved values
/// become the new starting draft.
pub struct ProfileForm {
    profiles: ProfileService,
    session: SessionStore,
    saved: Mutex<FormRecord>,
    schema: Schema,
}

impl ProfileForm {
    pub fn new(profiles: ProfileService, session: SessionStore, profile: Option<&Profile>) -> Self {
        let saved = FormRecord::new()
            .with(
                "fullName",
                profile.and_then(|p| p.full_name.clone()).unwrap_or_default(),
            )
            .with(
                "phone",
                profile.and_then(|p| p.phone.clone()).unwrap_or_default(),
            );
        Self {
            profiles,
            session,
            saved: Mutex::new(saved),
            schema: Schema::new()
                .field("fullName", full_name())
                .field("phone", contact_phone()),
        }
    }
}

#[async_trait]
impl FormHandler for ProfileForm {
    type Output = ();

    fn name(&self) -> &'static str {
        "profile"
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn initial(&self) -> FormRecord {
        self.saved.lock().expect("profile draft lock poisoned").clone()
    }

    async fn persist(&self, record: &FormRecord) -> NewsdeskResult<()> {
        let user_id = self
            .session
            .user_id()
            .ok_or_else(|| NewsdeskError::Unauthorized("not signed in".to_string()))?;
        let patch = Row::new()
            .with("full_name", record.text("fullName").trim())
            .with("phone", record.optional_text("phone"));
        self.profiles.update(&user_id, patch).await?;
        *self.saved.lock().expect("profile draft lock poisoned") = record.clone();
        tracing::info!(user = %user_id, "profile updated");
        Ok(())
    }

    fn failure_message(&self, _error: &NewsdeskError) -> String {
        "Failed to update profile".to_string()
    }
}
