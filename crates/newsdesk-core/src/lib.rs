//! # newsdesk-core
//!
//! Core types shared by every newsdesk crate. Has no dependency on the other
//! newsdesk crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types, result alias, and user-facing error classification
//! - [`settings`] - Settings structs with defaults
//! - [`settings_loader`] - Loading settings from TOML/JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`i18n`] - Translation catalogs and the [`Translator`](i18n::Translator) seam

pub mod error;
pub mod i18n;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use error::{ErrorCode, NewsdeskError, NewsdeskResult, ValidationError};
pub use i18n::{Catalog, Translator};
pub use settings::Settings;
