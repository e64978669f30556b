// Poll slot: the single "which loop is live" cell shared by the coordinator and its loops.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::snapshot::SessionKind;

/// Coordinator-level view of polling: nothing running, or exactly one loop of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling(SessionKind),
}

struct ActivePoll {
    kind: SessionKind,
    generation: u64,
    token: CancellationToken,
}

/// Ticket handed to a freshly started loop.
pub struct PollTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

pub struct PollSlot {
    /// Held while a tick is re-checked and dispatched, and by every cancel/replace, so a
    /// cancel returns only after any in-progress dispatch has finished. Reentrant because
    /// observers may stop polling from inside their callback.
    gate: ReentrantMutex<()>,
    active: Mutex<Option<ActivePoll>>,
    next_generation: AtomicU64,
}

impl PollSlot {
    pub fn new() -> Self {
        Self {
            gate: ReentrantMutex::new(()),
            active: Mutex::new(None),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Cancel whatever loop is live and register a new one of `kind`.
    /// Both happen under the slot lock, so two loops are never live at once.
    pub fn replace(&self, kind: SessionKind) -> PollTicket {
        let _gate = self.gate.lock();
        let mut active = self.active.lock();
        if let Some(old) = active.take() {
            old.token.cancel();
            debug!(
                "poll loop {} gen={} replaced by {}",
                old.kind, old.generation, kind
            );
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        *active = Some(ActivePoll {
            kind,
            generation,
            token: token.clone(),
        });
        PollTicket { generation, token }
    }

    /// Cancel the live loop, if any. Returns the kind that was cancelled.
    pub fn cancel(&self) -> Option<SessionKind> {
        let _gate = self.gate.lock();
        let old = self.active.lock().take()?;
        old.token.cancel();
        debug!("poll loop {} gen={} cancelled", old.kind, old.generation);
        Some(old.kind)
    }

    /// Cancel the live loop only if it is still the one started with `generation`.
    pub fn cancel_if_current(&self, generation: u64) -> bool {
        let _gate = self.gate.lock();
        let mut active = self.active.lock();
        match active.as_ref() {
            Some(poll) if poll.generation == generation => {
                poll.token.cancel();
                *active = None;
                true
            }
            _ => false,
        }
    }

    /// Block cancels and replaces until the guard is dropped. Check [`Self::is_current`]
    /// while holding it; the answer cannot change until the guard goes away.
    pub fn dispatch_gate(&self) -> ReentrantMutexGuard<'_, ()> {
        self.gate.lock()
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|poll| poll.generation == generation)
    }

    pub fn state(&self) -> PollState {
        match self.active.lock().as_ref() {
            Some(poll) => PollState::Polling(poll.kind),
            None => PollState::Idle,
        }
    }
}

impl Default for PollSlot {
    fn default() -> Self {
        Self::new()
    }
}
