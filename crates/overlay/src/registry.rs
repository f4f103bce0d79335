//! Registry of live overlay sessions
//!
//! Closing every overlay is a broadcast: the registry posts `CloseRequested`
//! into each session's queue and each session tears itself down when it gets
//! there, deregistering on the way out. Selection state is never shared.

use crate::config::{Addressing, EngineConfig};
use crate::session::{OverlaySession, SessionEvent, SessionId};
use crate::OverlayHost;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct OverlayRegistry {
    sessions: Mutex<HashMap<SessionId, Sender<SessionEvent>>>,
}

impl OverlayRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a session and register it
    pub fn open_session(
        self: &Arc<Self>,
        host: Arc<dyn OverlayHost>,
        config: EngineConfig,
        screen_index: usize,
    ) -> OverlaySession {
        let mut session = OverlaySession::open(host, config, screen_index);
        session.attach(Arc::clone(self));
        session
    }

    /// One session per screen with per-monitor addressing, a single one otherwise
    pub fn open_all(
        self: &Arc<Self>,
        host: Arc<dyn OverlayHost>,
        config: EngineConfig,
        screen_count: usize,
    ) -> Vec<OverlaySession> {
        let count = match config.addressing {
            Addressing::Single => 1,
            Addressing::PerMonitor => screen_count,
        };
        (0..count)
            .map(|index| self.open_session(Arc::clone(&host), config, index))
            .collect()
    }

    pub fn register(&self, id: SessionId, sender: Sender<SessionEvent>) {
        self.sessions.lock().insert(id, sender);
    }

    pub fn unregister(&self, id: SessionId) -> bool {
        self.sessions.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Ask every registered session to close; returns how many were signalled
    pub fn close_all(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();

        sessions.retain(|id, sender| {
            let delivered = sender.send(SessionEvent::CloseRequested).is_ok();
            if !delivered {
                log::debug!("Dropping stale overlay session {}", id);
            }
            delivered
        });

        log::info!("Close broadcast sent to {} of {} overlays", sessions.len(), before);
        sessions.len()
    }
}
