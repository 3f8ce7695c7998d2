use std::collections::HashMap;
use std::fmt;

use tokio::sync::RwLock;

use crate::auth::DisplayName;

/// A signed-in user. Holding one means the user is authenticated.
#[derive(Clone)]
pub struct Session {
    pub email: String,
    pub display_name: DisplayName,
    pub auth_token: String,
}

impl Session {
    /// Display name when the account has one, otherwise the email.
    pub fn greeting_name(&self) -> String {
        if self.display_name.is_empty() {
            self.email.clone()
        } else {
            self.display_name.full()
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Sessions keyed by chat user id. Each user only touches their own entry.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<u64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any session the user already had.
    pub async fn start(&self, user_id: u64, session: Session) {
        self.sessions.write().await.insert(user_id, session);
    }

    pub async fn get(&self, user_id: u64) -> Option<Session> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    /// Returns whether a session existed.
    pub async fn end(&self, user_id: u64) -> bool {
        self.sessions.write().await.remove(&user_id).is_some()
    }
}
