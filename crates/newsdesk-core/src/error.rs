//! Core error types for newsdesk.
//!
//! [`NewsdeskError`] covers every infrastructure failure the form pipeline can
//! observe: gateway and network failures, auth rejections, configuration
//! problems, and best-effort notification failures. Field-level validation
//! failures are *not* errors in the pipeline (they are a normal
//! `Err(FieldErrors)` from the validation engine); [`ValidationError`] exists
//! for callers that need to carry them across an error boundary.
//!
//! [`ErrorCode`] classifies raw backend errors into the small set of
//! user-facing categories the site shows messages for.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Represents a validation error with optional field-level errors.
///
/// # Examples
///
/// ```
/// use newsdesk_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required", "required");
/// assert_eq!(err.to_string(), "This field is required");
///
/// let mut field_errors = std::collections::HashMap::new();
/// field_errors.insert("email".to_string(), "Invalid email address".to_string());
/// let err = ValidationError::with_field_errors(field_errors);
/// assert!(err.to_string().contains("email: Invalid email address"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the failed rule (e.g. "required", "email").
    pub code: String,
    /// First error message per field, keyed by field name.
    pub field_errors: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, String>) -> Self {
        Self {
            message: String::new(),
            code: "invalid".to_string(),
            field_errors,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            return write!(f, "{}", self.message);
        }
        let mut fields: Vec<_> = self.field_errors.iter().collect();
        fields.sort();
        for (i, (field, message)) in fields.into_iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for newsdesk.
#[derive(Error, Debug)]
pub enum NewsdeskError {
    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    /// The request was well formed but cannot be acted on (e.g. no recipients).
    #[error("Bad request: {0}")]
    BadRequest(String),

    // ── Persistence ──────────────────────────────────────────────────

    /// A generic datastore error.
    #[error("Database error: {0}")]
    Database(String),

    /// A lookup expected a row but found none.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The hosted backend answered with a non-success status.
    #[error("Backend error ({status}): {message}")]
    Http {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Backend-specific error code, if one was returned (e.g. `PGRST116`).
        code: Option<String>,
        /// The backend's error message.
        message: String,
    },

    /// The request never reached the backend or the connection dropped.
    #[error("Network error: {0}")]
    Network(String),

    // ── Auth ─────────────────────────────────────────────────────────

    /// No signed-in user, or the credentials were rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The signed-in user lacks the role required for the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    // ── Side channel ─────────────────────────────────────────────────

    /// A fire-and-forget notification failed. Only ever logged.
    #[error("Notification failed: {0}")]
    Notification(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Serialization / IO ───────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsdeskError {
    /// Returns the backend-specific error code carried by this error, if any.
    pub fn backend_code(&self) -> Option<&str> {
        match self {
            Self::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for failures of the hosted backend or the network.
    ///
    /// These surface to the user as a single generic banner and are
    /// recoverable by resubmitting.
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::NotFound(_) | Self::Http { .. } | Self::Network(_)
        )
    }
}

impl From<serde_json::Error> for NewsdeskError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for NewsdeskError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// A convenience type alias for `Result<T, NewsdeskError>`.
pub type NewsdeskResult<T> = Result<T, NewsdeskError>;

/// User-facing classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Wrong email or password.
    InvalidCredentials,
    /// Sign-up with an address that already has an account.
    EmailInUse,
    /// The backend rejected the password as too weak.
    WeakPassword,
    /// The session expired or could not be refreshed.
    SessionExpired,
    /// Row-level security or role check refused the operation.
    PermissionDenied,
    /// The requested row does not exist.
    NotFound,
    /// Too many requests.
    RateLimited,
    /// The backend could not be reached.
    NetworkError,
    /// Input was rejected as invalid.
    ValidationError,
    /// Anything else.
    Unknown,
}

impl ErrorCode {
    /// Classifies an error by backend code and message content.
    ///
    /// Message checks run before code checks for the auth categories, matching
    /// how the hosted auth service reports failures (plain messages, no code).
    ///
    /// # Examples
    ///
    /// ```
    /// use newsdesk_core::error::{ErrorCode, NewsdeskError};
    ///
    /// let err = NewsdeskError::Unauthorized("Invalid login credentials".into());
    /// assert_eq!(ErrorCode::classify(&err), ErrorCode::InvalidCredentials);
    /// ```
    pub fn classify(error: &NewsdeskError) -> Self {
        if let NewsdeskError::Validation(_) = error {
            return Self::ValidationError;
        }
        let message = error.to_string().to_lowercase();
        let code = error.backend_code().unwrap_or_default();

        if message.contains("invalid login") || message.contains("invalid credentials") {
            return Self::InvalidCredentials;
        }
        if message.contains("already registered") || message.contains("already exists") {
            return Self::EmailInUse;
        }
        if message.contains("password") && (message.contains("weak") || message.contains("short")) {
            return Self::WeakPassword;
        }
        if message.contains("session") || message.contains("expired") || message.contains("refresh") {
            return Self::SessionExpired;
        }
        if code == "42501"
            || matches!(error, NewsdeskError::PermissionDenied(_))
            || message.contains("permission")
            || message.contains("denied")
        {
            return Self::PermissionDenied;
        }
        if code == "PGRST116"
            || matches!(error, NewsdeskError::NotFound(_))
            || message.contains("not found")
        {
            return Self::NotFound;
        }
        if message.contains("rate limit") || message.contains("too many") {
            return Self::RateLimited;
        }
        if matches!(error, NewsdeskError::Network(_))
            || message.contains("network")
            || message.contains("fetch")
            || message.contains("connection")
        {
            return Self::NetworkError;
        }
        Self::Unknown
    }

    /// The stable identifier logged alongside the error.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::EmailInUse => "AUTH_EMAIL_IN_USE",
            Self::WeakPassword => "AUTH_WEAK_PASSWORD",
            Self::SessionExpired => "AUTH_SESSION_EXPIRED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::NotFound => "NOT_FOUND",
            Self::RateLimited => "RATE_LIMITED",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// The English message shown for this code. Used as the msgid for
    /// localized lookup.
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Invalid email or password",
            Self::EmailInUse => "This email is already registered",
            Self::WeakPassword => "Password must be at least 8 characters",
            Self::SessionExpired => "Session expired. Please log in again.",
            Self::PermissionDenied => "You do not have permission to perform this action",
            Self::NotFound => "Resource not found.",
            Self::RateLimited => "Too many requests. Please try again later.",
            Self::NetworkError => "Network error. Please check your connection.",
            Self::ValidationError => "Please correct the highlighted fields",
            Self::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
