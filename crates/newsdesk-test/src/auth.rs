//! An in-memory [`AuthProvider`].
//!
//! Rejections use the same plain messages the hosted auth service sends, so
//! [`ErrorCode::classify`](newsdesk_core::ErrorCode::classify) maps them the
//! same way.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use newsdesk_auth::{AuthProvider, Role, Session, SessionStore, SignUp};
use newsdesk_core::{NewsdeskError, NewsdeskResult};

struct Account {
    password: String,
    session: Session,
}

#[derive(Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    current: Option<Session>,
    next_id: u64,
}

/// Accounts keyed by email, plus the currently signed-in session.
#[derive(Default)]
pub struct MemoryAuthProvider {
    accounts: Mutex<Accounts>,
}

fn rejected(message: &str) -> NewsdeskError {
    NewsdeskError::Http {
        status: 400,
        code: None,
        message: message.to_string(),
    }
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account with `role`.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, role: Role) -> Self {
        {
            let mut accounts = self.accounts.lock().expect("MemoryAuthProvider lock poisoned");
            let session = Self::new_session(&mut accounts, email, "").with_role(role);
            accounts.by_email.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    session,
                },
            );
        }
        self
    }

    /// Pretends a previous sign-in was persisted.
    #[must_use]
    pub fn with_current(self, session: Session) -> Self {
        self.accounts
            .lock()
            .expect("MemoryAuthProvider lock poisoned")
            .current = Some(session);
        self
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts
            .lock()
            .expect("MemoryAuthProvider lock poisoned")
            .by_email
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn new_session(accounts: &mut Accounts, email: &str, full_name: &str) -> Session {
        accounts.next_id += 1;
        let mut session = Session::new(format!("user-{}", accounts.next_id), email);
        session.full_name = full_name.to_string();
        session.access_token = Some(format!("token-{}", accounts.next_id));
        session
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn current_session(&self) -> NewsdeskResult<Option<Session>> {
        Ok(self
            .accounts
            .lock()
            .expect("MemoryAuthProvider lock poisoned")
            .current
            .clone())
    }

    async fn sign_up(&self, data: &SignUp) -> NewsdeskResult<Session> {
        let mut accounts = self.accounts.lock().expect("MemoryAuthProvider lock poisoned");
        if accounts.by_email.contains_key(&data.email) {
            return Err(rejected("User already registered"));
        }
        let session = Self::new_session(&mut accounts, &data.email, &data.full_name);
        accounts.by_email.insert(
            data.email.clone(),
            Account {
                password: data.password.clone(),
                session: session.clone(),
            },
        );
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> NewsdeskResult<Session> {
        let mut accounts = self.accounts.lock().expect("MemoryAuthProvider lock poisoned");
        let session = match accounts.by_email.get(email) {
            Some(account) if account.password == password => account.session.clone(),
            _ => return Err(rejected("Invalid login credentials")),
        };
        accounts.current = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> NewsdeskResult<()> {
        self.accounts
            .lock()
            .expect("MemoryAuthProvider lock poisoned")
            .current = None;
        Ok(())
    }
}

/// A session store already signed in with `role`.
pub fn signed_in_as(role: Role) -> SessionStore {
    let user = match role {
        Role::Admin => "admin-1",
        Role::Moderator => "moderator-1",
        Role::User => "user-1",
    };
    SessionStore::signed_in(Session::new(user, format!("{user}@newsdesk.test")).with_role(role))
}
