//! # newsdesk-auth
//!
//! The contract newsdesk needs from the hosted auth service: who is signed
//! in, what role they hold, and whether the session is still loading.
//!
//! - [`Role`] and [`Session`] describe a signed-in user.
//! - [`AuthProvider`] is the seam to the auth service (sign up, sign in,
//!   sign out, current session).
//! - [`SessionStore`] is the shared, injectable session state. Its
//!   [`bootstrap`](SessionStore::bootstrap) never leaves the store loading
//!   for longer than the configured fail-safe timeout.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use newsdesk_core::{NewsdeskError, NewsdeskResult};
use serde::{Deserialize, Serialize};

/// A user's role, stored on their profile row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular site user.
    #[default]
    User,
    /// Can review and update requests.
    Moderator,
    /// Full back-office access.
    Admin,
}

impl Role {
    /// The stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(NewsdeskError::BadRequest(format!("unknown role '{other}'"))),
        }
    }
}

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user's id (also the id of their profile row).
    pub user_id: String,
    /// The address the user signed in with.
    pub email: String,
    /// Display name from the profile.
    pub full_name: String,
    /// The profile role.
    pub role: Role,
    /// Token for authenticating backend calls as this user.
    pub access_token: Option<String>,
}

impl Session {
    /// Creates a session with the `User` role and no token.
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            full_name: String::new(),
            role: Role::User,
            access_token: None,
        }
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Sets the token backend calls are authenticated with.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// The token backend calls are authenticated with, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns `true` for admins.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns `true` for moderators and admins.
    pub fn is_moderator(&self) -> bool {
        matches!(self.role, Role::Moderator | Role::Admin)
    }
}

/// Data collected by the signup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    /// Account email.
    pub email: String,
    /// Plain-text password; only ever handed to the provider.
    pub password: String,
    /// Display name.
    pub full_name: String,
}

/// The hosted auth service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns the session persisted by a previous sign-in, if any.
    async fn current_session(&self) -> NewsdeskResult<Option<Session>>;

    /// Creates an account. The returned session may be unconfirmed.
    async fn sign_up(&self, data: &SignUp) -> NewsdeskResult<Session>;

    /// Signs in with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> NewsdeskResult<Session>;

    /// Ends the current session.
    async fn sign_out(&self) -> NewsdeskResult<()>;
}

/// Snapshot of the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// The signed-in user, if any.
    pub session: Option<Session>,
    /// `true` until bootstrap finishes or times out.
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }
}

/// Shared session state handed to every service and form that needs it.
///
/// Cloning is cheap; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    /// A store that is still loading.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `session` (not loading).
    pub fn signed_in(session: Session) -> Self {
        let store = Self::new();
        store.set(Some(session));
        store
    }

    /// A store with no user (not loading).
    pub fn anonymous() -> Self {
        let store = Self::new();
        store.set(None);
        store
    }

    /// Loads the persisted session from `provider`.
    ///
    /// If the provider fails, or does not answer within `timeout`, the
    /// store ends up anonymous and no longer loading.
    pub async fn bootstrap(&self, provider: &dyn AuthProvider, timeout: Duration) {
        let session = match tokio::time::timeout(timeout, provider.current_session()).await {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => {
                tracing::error!(error = %err, "failed to get session");
                None
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis(), "session bootstrap timed out");
                None
            }
        };
        self.set(session);
    }

    /// Replaces the session and clears the loading flag.
    pub fn set(&self, session: Option<Session>) {
        let mut state = self.state.write().expect("session lock poisoned");
        state.session = session;
        state.loading = false;
    }

    /// Returns a snapshot of the state.
    pub fn snapshot(&self) -> SessionState {
        self.state.read().expect("session lock poisoned").clone()
    }

    /// Returns the signed-in session, if any.
    pub fn session(&self) -> Option<Session> {
        self.snapshot().session
    }

    /// The signed-in user's id, if any.
    pub fn user_id(&self) -> Option<String> {
        self.session().map(|s| s.user_id)
    }

    /// The signed-in user's access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.session().and_then(|s| s.access_token)
    }

    /// Whether bootstrap is still in progress.
    pub fn is_loading(&self) -> bool {
        self.snapshot().loading
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Whether the signed-in user is an admin.
    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_admin())
    }

    /// Whether the signed-in user is a moderator or admin.
    pub fn is_moderator(&self) -> bool {
        self.session().is_some_and(|s| s.is_moderator())
    }

    /// Returns the session if its role is at least moderator.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when nobody is signed in, `PermissionDenied` for plain users.
    pub fn require_moderator(&self) -> NewsdeskResult<Session> {
        let session = self
            .session()
            .ok_or_else(|| NewsdeskError::Unauthorized("sign in required".to_string()))?;
        if session.is_moderator() {
            Ok(session)
        } else {
            Err(NewsdeskError::PermissionDenied(
                "moderator role required".to_string(),
            ))
        }
    }

    /// Returns the session if its role is admin.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when nobody is signed in, `PermissionDenied` otherwise.
    pub fn require_admin(&self) -> NewsdeskResult<Session> {
        let session = self
            .session()
            .ok_or_else(|| NewsdeskError::Unauthorized("sign in required".to_string()))?;
        if session.is_admin() {
            Ok(session)
        } else {
            Err(NewsdeskError::PermissionDenied("admin role required".to_string()))
        }
    }
}
