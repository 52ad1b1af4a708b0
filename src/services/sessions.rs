use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime, Utc};

use crate::services::conversation::ChatEngine;

pub type SharedEngine = Arc<tokio::sync::Mutex<ChatEngine>>;

struct Session {
    engine: SharedEngine,
    expires_at: NaiveDateTime,
}

/// One engine per chat session id, dropped after a period of inactivity.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Engine for `id`, creating one with `make` when the session is new or expired.
    pub fn checkout(&self, id: &str, make: impl FnOnce() -> ChatEngine) -> SharedEngine {
        let now = Utc::now().naive_utc();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "dropped idle chat sessions");
        }

        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            tracing::info!(session_id = id, "new chat session");
            Session {
                engine: Arc::new(tokio::sync::Mutex::new(make())),
                expires_at: now,
            }
        });
        session.expires_at = now + self.ttl;
        Arc::clone(&session.engine)
    }

    /// Engine for a live session, if any.
    pub fn get(&self, id: &str) -> Option<SharedEngine> {
        let now = Utc::now().naive_utc();
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(id)
            .filter(|s| s.expires_at > now)
            .map(|s| Arc::clone(&s.engine))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
