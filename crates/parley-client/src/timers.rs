//! Cancellable single-shot timers.
//!
//! Each [`TimerKind`] has at most one pending timer. Scheduling a kind that
//! is already pending aborts the old task first, so timers restart instead
//! of stacking. A firing is delivered as a [`TimerFired`] on the channel
//! given to [`Timers::new`] and must be passed back through
//! [`Timers::accept`], which rejects firings from timers that were
//! cancelled or rescheduled after their task had already sent.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Gives up on a connection stuck in `connecting`.
    ConnectTimeout,
    /// Sends "stopped typing" after the last keystroke.
    TypingDebounce,
    /// Ends a joined session whose connection did not come back.
    DisconnectGrace,
    /// Rebuilds the transport after leaving.
    Reload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub kind: TimerKind,
    generation: u64,
}

struct Pending {
    generation: u64,
    task: JoinHandle<()>,
}

pub struct Timers {
    tx: mpsc::UnboundedSender<TimerFired>,
    pending: HashMap<TimerKind, Pending>,
    next_generation: u64,
}

impl Timers {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            tx,
            pending: HashMap::new(),
            next_generation: 0,
        }
    }

    /// (Re)start the timer for `kind`. Must be called inside a tokio runtime.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired { kind, generation });
        });

        debug!(timer = ?kind, delay_ms = delay.as_millis() as u64, "Timer scheduled");
        self.pending.insert(kind, Pending { generation, task });
    }

    /// Cancel the pending timer for `kind`, returning whether one existed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.pending.remove(&kind) {
            Some(pending) => {
                pending.task.abort();
                debug!(timer = ?kind, "Timer cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.pending.contains_key(&kind)
    }

    /// Claim a firing. Returns `false` for stale firings, which must be ignored.
    pub fn accept(&mut self, fired: TimerFired) -> bool {
        match self.pending.get(&fired.kind) {
            Some(p) if p.generation == fired.generation => {
                self.pending.remove(&fired.kind);
                true
            }
            _ => {
                debug!(timer = ?fired.kind, "Ignoring stale timer firing");
                false
            }
        }
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
