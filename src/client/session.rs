//! Session provider
//!
//! Broadcasts login and logout events from the identity layer to the sync
//! coordinator and anything else that gates work on the signed-in user.
//! The hub also remembers the current session so late subscribers can
//! catch up.

use crate::shared::session::UserSession;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

const SESSION_CHANNEL_CAPACITY: usize = 16;

/// Session lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(UserSession),
    Ended,
}

/// Broadcast hub for session events
#[derive(Debug, Clone)]
pub struct SessionHub {
    tx: broadcast::Sender<SessionEvent>,
    current: Arc<RwLock<Option<UserSession>>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(SESSION_CHANNEL_CAPACITY);
        Self {
            tx,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Announce a signed-in user
    ///
    /// Starting a session while another is active ends the previous one
    /// first, so listeners always observe `Ended` between two users.
    pub fn start(&self, session: UserSession) {
        let previous = self.set_current(Some(session.clone()));
        if previous.is_some() {
            self.emit(SessionEvent::Ended);
        }
        tracing::info!("[Session] Started for {}", session.user_id);
        self.emit(SessionEvent::Started(session));
    }

    /// Announce sign-out; no-op without an active session
    pub fn end(&self) {
        if let Some(previous) = self.set_current(None) {
            tracing::info!("[Session] Ended for {}", previous.user_id);
            self.emit(SessionEvent::Ended);
        }
    }

    pub fn current(&self) -> Option<UserSession> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    fn set_current(&self, session: Option<UserSession>) -> Option<UserSession> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *current, session)
    }

    fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("[Session] No listeners for session event");
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}
