//! # Background Sync Tasks
//!
//! Per-session tasks owned by the [`SyncCoordinator`], plus the listener
//! that drives the coordinator from session events.
//!
//! ## Tasks
//!
//! - **Flush Worker**: sleeps until a toggle arrives or the earliest retry
//!   is due, waits out the debounce window, then flushes everything ready
//! - **Watch Task**: feeds real-time snapshots through the reconciler
//! - **Session Listener**: maps login/logout on a [`SessionHub`] to
//!   `on_session_start` and `on_session_end`
//!
//! Worker and watch tasks carry the generation they were spawned for and
//! exit on their own once it is no longer current. Ending the session also
//! aborts them, so neither ever touches the next user's state.

use super::SyncCoordinator;
use crate::client::remote::FavoritesWatch;
use crate::client::session::{SessionEvent, SessionHub};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Flush loop for one session generation
pub(crate) async fn run_worker(coordinator: SyncCoordinator, generation: u64) {
    tracing::debug!("[Sync] Flush worker started (generation {})", generation);
    let debounce = coordinator.flush_debounce();

    loop {
        let Some((ready, next_retry)) = coordinator.schedule(generation).await else {
            break;
        };

        if !ready {
            match next_retry {
                Some(deadline) => {
                    tokio::select! {
                        _ = coordinator.wake().notified() => {}
                        _ = tokio::time::sleep_until(deadline) => {}
                    }
                }
                None => coordinator.wake().notified().await,
            }
        }

        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }

        let report = coordinator.flush_pending().await;
        if report.dispatched > 0 {
            tracing::debug!(
                "[Sync] Flushed {} changes: {} confirmed, {} retrying, {} stalled",
                report.dispatched,
                report.confirmed,
                report.retrying,
                report.stalled
            );
        }
    }

    tracing::debug!("[Sync] Flush worker stopped (generation {})", generation);
}

/// Real-time snapshot loop for one session generation
pub(crate) async fn run_watch(
    coordinator: SyncCoordinator,
    generation: u64,
    mut watch: FavoritesWatch,
) {
    while let Some(snapshot) = watch.next().await {
        if !coordinator.apply_remote_snapshot(generation, snapshot).await {
            break;
        }
    }
    watch.unsubscribe();
    tracing::debug!("[Sync] Watch closed (generation {})", generation);
}

/// Handle to a coordinator attached to a [`SessionHub`]
///
/// The coordinator follows the hub until the handle is detached or dropped.
#[derive(Debug)]
pub struct SessionListener {
    task: JoinHandle<()>,
}

impl SessionListener {
    /// Stop following the hub; the current session stays active
    pub fn detach(self) {}

    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SyncCoordinator {
    /// Follow login and logout events on `hub`
    ///
    /// A session already active on the hub is started immediately. Must be
    /// called from within a Tokio runtime.
    pub fn attach(&self, hub: &SessionHub) -> SessionListener {
        let mut rx = hub.subscribe();
        let hub = hub.clone();
        let coordinator = self.clone();

        let task = tokio::spawn(async move {
            if let Some(session) = hub.current() {
                coordinator.on_session_start(session).await;
            }

            loop {
                match rx.recv().await {
                    Ok(SessionEvent::Started(session)) => {
                        coordinator.on_session_start(session).await;
                    }
                    Ok(SessionEvent::Ended) => coordinator.on_session_end().await,
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            "[Session] Listener missed {} session events, resyncing",
                            missed
                        );
                        match hub.current() {
                            Some(session) => {
                                coordinator.on_session_start(session).await;
                            }
                            None => coordinator.on_session_end().await,
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        SessionListener { task }
    }
}
