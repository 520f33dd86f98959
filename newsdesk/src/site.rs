//! Wiring for a running site.
//!
//! A [`Site`] owns the settings, the gateway, the session store, and the
//! translator, and hands out services and form controllers built from them.

use std::sync::Arc;
use std::time::Duration;

use newsdesk_auth::{AuthProvider, SessionStore};
use newsdesk_core::logging::setup_logging;
use newsdesk_core::{Catalog, NewsdeskResult, Settings, Translator};
use newsdesk_db::{
    ContentSearch, PersistenceGateway, ProfileService, RequestService, RestGateway,
};
use newsdesk_forms::forms::{
    AdRequestForm, AdminNotificationForm, LoginForm, ProfileForm, ServiceRequestForm, SignupForm,
};
use newsdesk_forms::{FormController, FormHandler};
use newsdesk_notify::{Inbox, StoreNotifier, WebhookNotifier};

/// Shared services for one site instance.
pub struct Site {
    settings: Settings,
    gateway: Arc<dyn PersistenceGateway>,
    session: SessionStore,
    translator: Arc<dyn Translator>,
}

impl Site {
    /// Connects to the hosted backend named in `settings` and installs the
    /// log subscriber. Backend calls authenticate as whoever is signed in to
    /// [`session`](Self::session).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend URL or key is missing.
    pub fn connect(settings: Settings) -> NewsdeskResult<Self> {
        setup_logging(&settings);
        let session = SessionStore::new();
        let gateway = RestGateway::new(&settings.backend)?.with_session(session.clone());
        tracing::info!(backend = %settings.backend.url, language = %settings.language_code, "site connected");
        Ok(Self::assemble(settings, Arc::new(gateway), session))
    }

    /// Builds a site over an existing gateway.
    pub fn with_gateway(settings: Settings, gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self::assemble(settings, gateway, SessionStore::new())
    }

    fn assemble(
        settings: Settings,
        gateway: Arc<dyn PersistenceGateway>,
        session: SessionStore,
    ) -> Self {
        let translator = Arc::new(Catalog::builtin(&settings.language_code));
        Self {
            settings,
            gateway,
            session,
            translator,
        }
    }

    /// Replaces the translator, e.g. after the user switches language.
    #[must_use]
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    /// The settings the site was built with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The session shared by every service and form of this site.
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    /// The translator forms render their messages with.
    pub fn translator(&self) -> Arc<dyn Translator> {
        Arc::clone(&self.translator)
    }

    /// Loads the persisted session, giving up after the configured timeout.
    pub async fn bootstrap(&self, auth: &dyn AuthProvider) {
        let timeout = Duration::from_millis(self.settings.auth.bootstrap_timeout_ms);
        self.session.bootstrap(auth, timeout).await;
    }

    /// Submission and review of service and ad requests.
    pub fn requests(&self) -> RequestService {
        RequestService::new(Arc::clone(&self.gateway), self.session.clone())
    }

    /// Profile lookups and updates.
    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(Arc::clone(&self.gateway), self.session.clone())
    }

    /// The signed-in user's notifications.
    pub fn inbox(&self) -> Inbox {
        Inbox::new(Arc::clone(&self.gateway))
    }

    /// Search over published content.
    pub fn search(&self) -> ContentSearch {
        ContentSearch::new(Arc::clone(&self.gateway))
    }

    fn controller<H: FormHandler>(&self, handler: H) -> FormController<H> {
        FormController::new(handler, self.translator(), &self.settings.forms)
    }

    /// The ad request form, notifying admins through the ad webhook.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the webhook client cannot be built.
    pub fn ad_request_form(&self) -> NewsdeskResult<FormController<AdRequestForm>> {
        let notifier = WebhookNotifier::new(&self.settings, &self.settings.notify.admin_ad_function)?;
        Ok(self.controller(AdRequestForm::new(
            self.requests(),
            self.session.clone(),
            Arc::new(notifier),
        )))
    }

    /// The service request form, notifying admins through the service webhook.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the webhook client cannot be built.
    pub fn service_request_form(&self) -> NewsdeskResult<FormController<ServiceRequestForm>> {
        let notifier = WebhookNotifier::new(&self.settings, &self.settings.notify.admin_function)?;
        Ok(self.controller(ServiceRequestForm::new(
            self.requests(),
            self.session.clone(),
            Arc::new(notifier),
        )))
    }

    /// Account creation.
    pub fn signup_form(&self, auth: Arc<dyn AuthProvider>) -> FormController<SignupForm> {
        self.controller(SignupForm::new(auth))
    }

    /// Sign-in; a successful login updates [`session`](Self::session).
    pub fn login_form(&self, auth: Arc<dyn AuthProvider>) -> FormController<LoginForm> {
        self.controller(LoginForm::new(auth, self.session.clone()))
    }

    /// Broadcast or targeted announcements, admins only.
    pub fn admin_notification_form(&self) -> FormController<AdminNotificationForm> {
        self.controller(AdminNotificationForm::new(
            StoreNotifier::new(Arc::clone(&self.gateway)),
            self.profiles(),
            self.session.clone(),
        ))
    }

    /// A profile form pre-filled from the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns the gateway's error if the profile cannot be loaded.
    pub async fn profile_form(&self) -> NewsdeskResult<FormController<ProfileForm>> {
        let profiles = self.profiles();
        let current = match self.session.user_id() {
            Some(user_id) => profiles.get(&user_id).await?,
            None => None,
        };
        Ok(self.controller(ProfileForm::new(
            profiles,
            self.session.clone(),
            current.as_ref(),
        )))
    }
}
