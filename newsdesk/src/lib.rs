//! # newsdesk
//!
//! Request intake, accounts, and announcements for a multilingual news site.
//!
//! This is the top-level crate that re-exports the newsdesk crates so a
//! front end only needs one dependency. The [`site`] module wires them
//! together from one [`Settings`](core::Settings) value.
//!
//! ## Crates
//!
//! - [`core`] - Errors, settings, logging, and message translation
//! - [`db`] - Persistence gateway, typed rows, and request/profile services
//! - [`auth`] - Roles, sessions, and the auth provider seam
//! - [`notify`] - Notification fan-out and the user inbox
//! - [`forms`] - Validation engine, submission guard, and form controller
//! - `test` - Recording doubles and fixtures (enable the `testing` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use newsdesk::core::settings_loader::from_toml_file_with_env;
//! use newsdesk::site::Site;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = from_toml_file_with_env("newsdesk.toml")?;
//! let site = Site::connect(settings)?;
//! let form = site.service_request_form()?;
//! form.set_field("institutionName", "Acme Media Group");
//! # Ok(())
//! # }
//! ```

pub mod site;

/// Errors, settings, logging, and message translation.
pub use newsdesk_core as core;

/// Persistence gateway, typed rows, and request/profile services.
pub use newsdesk_db as db;

/// Roles, sessions, and the auth provider seam.
pub use newsdesk_auth as auth;

/// Notification fan-out and the user inbox.
pub use newsdesk_notify as notify;

/// Validation engine, submission guard, and form controller.
pub use newsdesk_forms as forms;

/// Recording doubles and fixtures for tests.
#[cfg(feature = "testing")]
pub use newsdesk_test as test;

// Re-export commonly used third-party crates for convenience
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;
