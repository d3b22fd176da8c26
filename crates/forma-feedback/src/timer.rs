//! Debounce scheduler
//!
//! Holds at most one pending item with a deadline. Scheduling again replaces
//! the pending item (latest wins) and cancels the previous token. Deadlines
//! are checked by the owner as it runs (`take_due`), so nothing here spawns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::Instant;

/// Cancellation handle for a scheduled item
#[derive(Debug, Clone)]
pub struct TimerToken {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TimerToken {
    fn new(id: u64) -> Self {
        TimerToken {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Pending<T> {
    item: T,
    due: Instant,
    token: TimerToken,
}

#[derive(Debug)]
pub struct DebounceScheduler<T> {
    pending: Option<Pending<T>>,
    next_id: u64,
}

impl<T> Default for DebounceScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DebounceScheduler<T> {
    pub fn new() -> Self {
        DebounceScheduler {
            pending: None,
            next_id: 0,
        }
    }

    /// Park `item` until `due`, replacing anything already pending
    pub fn schedule(&mut self, item: T, due: Instant) -> TimerToken {
        if let Some(old) = self.pending.take() {
            old.token.cancel();
        }
        self.next_id += 1;
        let token = TimerToken::new(self.next_id);
        self.pending = Some(Pending {
            item,
            due,
            token: token.clone(),
        });
        token
    }

    /// Cancel and drop the pending item
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| {
            p.token.cancel();
            p.item
        })
    }

    /// Remove and return the pending item once its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some(p) if p.token.is_cancelled() => {
                self.pending = None;
                None
            }
            Some(p) if p.due <= now => self.pending.take().map(|p| p.item),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .filter(|p| !p.token.is_cancelled())
            .map(|p| p.due)
    }

    pub fn is_pending(&self) -> bool {
        self.deadline().is_some()
    }
}
