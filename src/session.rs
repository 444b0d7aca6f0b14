//! Per-chat dialog sessions.
//!
//! Each chat has at most one active workflow. Starting a new workflow
//! replaces whatever was in progress (last start wins), finishing or
//! cancelling removes the entry. Sessions optionally expire after a
//! configured idle TTL; expiry is enforced lazily on lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::core::config;
use crate::workflow::DialogState;

#[derive(Debug, Clone)]
struct Session {
    state: DialogState,
    started_at: Instant,
}

/// Shared in-memory store of active dialog sessions, keyed by chat id.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<i64, Session>>>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Store with the TTL taken from configuration.
    pub fn new() -> Self {
        Self::with_ttl(config::session::ttl())
    }

    /// Store with an explicit TTL. `None` means sessions never expire.
    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Begins a workflow for the chat, replacing any session in progress.
    pub async fn start(&self, chat_id: i64, state: DialogState) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            chat_id,
            Session {
                state,
                started_at: Instant::now(),
            },
        );
    }

    /// Moves an existing session to the next state. A no-op when the chat
    /// has no active session (it may have been cancelled or expired).
    pub async fn advance(&self, chat_id: i64, state: DialogState) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&chat_id) {
            session.state = state;
        }
    }

    /// Current state of the chat's session, if any. Expired sessions are
    /// dropped here and reported as absent.
    pub async fn get(&self, chat_id: i64) -> Option<DialogState> {
        let mut sessions = self.sessions.lock().await;
        if let Some(ttl) = self.ttl {
            if let Some(session) = sessions.get(&chat_id) {
                if session.started_at.elapsed() > ttl {
                    sessions.remove(&chat_id);
                    return None;
                }
            }
        }
        sessions.get(&chat_id).map(|s| s.state.clone())
    }

    /// Removes the chat's session, whether it finished or was cancelled.
    pub async fn finish(&self, chat_id: i64) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&chat_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{AddAdminState, SearchState};

    #[tokio::test]
    async fn last_start_wins() {
        let store = SessionStore::with_ttl(None);
        store.start(1, DialogState::Search(SearchState::WaitingForQuery)).await;
        store.start(1, DialogState::AddAdmin(AddAdminState::WaitingForId)).await;

        assert_eq!(
            store.get(1).await,
            Some(DialogState::AddAdmin(AddAdminState::WaitingForId))
        );
    }

    #[tokio::test]
    async fn advance_without_session_is_noop() {
        let store = SessionStore::with_ttl(None);
        store.advance(1, DialogState::Search(SearchState::WaitingForQuery)).await;
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn finish_clears_session() {
        let store = SessionStore::with_ttl(None);
        store.start(1, DialogState::Search(SearchState::WaitingForQuery)).await;
        store.finish(1).await;
        assert_eq!(store.get(1).await, None);
    }

    #[tokio::test]
    async fn expired_session_reported_absent() {
        let store = SessionStore::with_ttl(Some(Duration::ZERO));
        store.start(1, DialogState::Search(SearchState::WaitingForQuery)).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(store.get(1).await, None);
    }
}
