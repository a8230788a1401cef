//! Shared application state for the HTTP server.

use crate::chat::ChatEngine;
use crate::config::ServerConfig;
use crate::error::ChatError;
use crate::session::{SessionHandle, SessionStore};
use uuid::Uuid;

/// Everything a handler needs: the engine, the live sessions, the limits.
pub struct AppState {
    pub engine: ChatEngine,
    pub sessions: SessionStore,
    pub server: ServerConfig,
}

impl AppState {
    pub fn new(engine: ChatEngine, server: ServerConfig) -> Self {
        let sessions = match server.session_idle_ttl() {
            Some(ttl) => SessionStore::with_idle_ttl(ttl),
            None => SessionStore::new(),
        };
        Self {
            engine,
            sessions,
            server,
        }
    }

    /// Handle for `id`, or [`ChatError::SessionNotFound`].
    pub fn session(&self, id: Uuid) -> Result<SessionHandle, ChatError> {
        self.sessions.get(&id).ok_or(ChatError::SessionNotFound(id))
    }
}
