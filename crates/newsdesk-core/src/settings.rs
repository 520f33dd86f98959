//! Settings for newsdesk.
//!
//! [`Settings`] holds every tunable the form pipeline reads. Unlike a global
//! settings object, an instance is built once at startup (see
//! [`settings_loader`](crate::settings_loader)) and handed to the services
//! and controllers that need it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the hosted datastore/auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL of the hosted project, e.g. `https://xyz.example.co`.
    pub url: String,
    /// Public (anonymous) API key sent with every request.
    pub anon_key: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_ms: 15_000,
        }
    }
}

/// Timing of guarded form submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSettings {
    /// Window after a submission starts during which a new one is debounced.
    pub debounce_ms: u64,
    /// How long a form shows its success state before resetting.
    pub success_display_ms: u64,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            success_display_ms: 4_000,
        }
    }
}

impl FormSettings {
    /// The debounce window as a [`Duration`].
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The success display window as a [`Duration`].
    pub const fn success_display(&self) -> Duration {
        Duration::from_millis(self.success_display_ms)
    }
}

/// Session bootstrap settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// After this many milliseconds the session is considered loaded even if
    /// the provider never answered.
    pub bootstrap_timeout_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bootstrap_timeout_ms: 5_000,
        }
    }
}

/// Admin side-channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Function notified about new service requests.
    pub admin_function: String,
    /// Function notified about new ad requests.
    pub admin_ad_function: String,
    /// Timeout for a single outbound notification call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            admin_function: "notify-admin".to_string(),
            admin_ad_function: "notify-admin-ad".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// The complete set of newsdesk settings.
///
/// # Examples
///
/// ```
/// use newsdesk_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.forms.debounce_ms, 300);
/// assert_eq!(settings.language_code, "en");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled. Selects the pretty log format.
    pub debug: bool,
    /// The log filter directive (e.g. "info", "newsdesk_forms=debug").
    pub log_level: String,
    /// The active language: `en`, `ar`, or `fr`.
    pub language_code: String,
    /// Hosted datastore connection.
    pub backend: BackendSettings,
    /// Form submission timing.
    pub forms: FormSettings,
    /// Session bootstrap.
    pub auth: AuthSettings,
    /// Admin notification side channel.
    pub notify: NotifySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            language_code: "en".to_string(),
            backend: BackendSettings::default(),
            forms: FormSettings::default(),
            auth: AuthSettings::default(),
            notify: NotifySettings::default(),
        }
    }
}

impl Settings {
    /// URL of a named serverless function on the hosted backend.
    ///
    /// ```
    /// use newsdesk_core::settings::Settings;
    ///
    /// let mut settings = Settings::default();
    /// settings.backend.url = "https://project.example.co/".into();
    /// assert_eq!(
    ///     settings.function_url("notify-admin"),
    ///     "https://project.example.co/functions/v1/notify-admin"
    /// );
    /// ```
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{name}", self.backend.url.trim_end_matches('/'))
    }
}
