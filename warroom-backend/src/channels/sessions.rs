//! Follow-up state for the buttons under a council reply.
//!
//! Buttons only carry a short id in their custom_id; the brief, the results
//! and the filter they act on live here until the session goes idle.

use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::models::OfficerResult;

const MAX_SESSIONS: u64 = 1_000;
const SESSION_IDLE: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone)]
pub enum FollowUpSession {
    Mission {
        brief: String,
        results: Vec<OfficerResult>,
        filter: Option<String>,
    },
    Research {
        topic: String,
        results: Vec<OfficerResult>,
        class: String,
        web_search: bool,
    },
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, Arc<FollowUpSession>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS, SESSION_IDLE)
    }
}

impl SessionStore {
    pub fn new(max_sessions: u64, idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Store a session and return the id to embed in component custom ids
    pub fn insert(&self, session: FollowUpSession) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.insert(id.clone(), Arc::new(session));
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<FollowUpSession>> {
        self.sessions.get(id)
    }
}
