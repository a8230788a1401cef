//! Conversation state, one instance per chat session.
//!
//! A [`SessionState`] is passed explicitly into every engine call; there is
//! no ambient or process-wide state. The server keeps live sessions in a
//! [`SessionStore`], each behind its own async mutex so a turn runs to
//! completion before the next request for that session is handled.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything one conversation remembers.
///
/// `pdf_text` and `data_context` are independent; an empty string means
/// "not loaded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub messages: Vec<Message>,
    pub pdf_text: String,
    pub data_context: String,
    pub request_count: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pdf(&self) -> bool {
        !self.pdf_text.is_empty()
    }

    pub fn has_data(&self) -> bool {
        !self.data_context.is_empty()
    }

    /// Latest assistant reply, if any.
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Forget the conversation. Loaded artifacts stay.
    pub fn clear_chat(&mut self) {
        self.messages.clear();
        self.request_count = 0;
    }

    /// Forget both artifacts. The conversation stays.
    pub fn remove_files(&mut self) {
        self.pdf_text.clear();
        self.data_context.clear();
    }
}

/// Serializable view of a session for the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
    pub request_count: u64,
    pub pdf_loaded: bool,
    pub data_loaded: bool,
}

impl SessionSnapshot {
    pub fn of(session_id: Uuid, state: &SessionState) -> Self {
        Self {
            session_id,
            messages: state.messages.clone(),
            request_count: state.request_count,
            pdf_loaded: state.has_pdf(),
            data_loaded: state.has_data(),
        }
    }
}

/// Shared handle to one live session.
pub type SessionHandle = Arc<Mutex<SessionState>>;

#[derive(Debug)]
struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// Live sessions keyed by id.
///
/// With an idle limit, a session nobody has looked up for that long is
/// dropped the next time the store is used: `create` sweeps every entry,
/// `get` checks the one asked for. A session whose handle is still held
/// elsewhere (a turn in flight) is never dropped.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, Entry>,
    idle_ttl: Option<Duration>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that drops sessions idle for at least `ttl`.
    pub fn with_idle_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl: Some(ttl),
        }
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    /// Start an empty session and return its id.
    pub fn create(&self) -> Uuid {
        let now = Instant::now();
        self.evict_idle(now);

        let id = Uuid::new_v4();
        self.sessions.insert(
            id,
            Entry {
                handle: Arc::new(Mutex::new(SessionState::new())),
                last_seen: now,
            },
        );
        debug!(session = %id, "Session created");
        id
    }

    /// Handle for `id`, refreshing its idle clock.
    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.get_at(id, Instant::now())
    }

    fn get_at(&self, id: &Uuid, now: Instant) -> Option<SessionHandle> {
        if self
            .sessions
            .remove_if(id, |_, entry| self.is_idle(entry, now))
            .is_some()
        {
            debug!(session = %id, "Session expired");
            return None;
        }
        let mut entry = self.sessions.get_mut(id)?;
        entry.last_seen = now;
        Some(Arc::clone(&entry.handle))
    }

    /// Drop a session. Returns false if it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!(session = %id, "Session ended");
        }
        removed
    }

    /// Drop every session idle at `now`; returns how many went.
    pub fn evict_idle(&self, now: Instant) -> usize {
        if self.idle_ttl.is_none() {
            return 0;
        }
        let mut evicted = 0;
        self.sessions.retain(|id, entry| {
            let idle = self.is_idle(entry, now);
            if idle {
                debug!(session = %id, "Session expired");
                evicted += 1;
            }
            !idle
        });
        evicted
    }

    fn is_idle(&self, entry: &Entry, now: Instant) -> bool {
        match self.idle_ttl {
            Some(ttl) => {
                Arc::strong_count(&entry.handle) == 1
                    && now.saturating_duration_since(entry.last_seen) >= ttl
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
