//! Bounded single-consumer mailbox.
//!
//! Multiple producers, exactly one consumer (the owning actor's worker).
//! Messages from a single sender are delivered in send order; no ordering
//! holds across senders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Enqueue failed because the owning worker has already terminated.
#[derive(Debug, Error)]
#[error("mailbox for actor '{actor}' is closed")]
pub struct SendError {
    pub actor: &'static str,
}

/// Producer half of an actor's mailbox. Cheap to clone.
#[derive(Debug)]
pub struct Mailbox<M> {
    tx: mpsc::Sender<M>,
    actor: &'static str,
    dropped: Arc<AtomicU64>,
}

impl<M> Clone for Mailbox<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            actor: self.actor,
            dropped: Arc::clone(&self.dropped),
        }
    }
}

/// Consumer half, held by the worker loop.
pub struct MailboxReceiver<M> {
    rx: mpsc::Receiver<M>,
    actor: &'static str,
}

/// Create a mailbox pair for the named actor.
pub fn mailbox<M>(actor: &'static str, capacity: usize) -> (Mailbox<M>, MailboxReceiver<M>) {
    let (tx, rx) = mpsc::channel(capacity);
    (
        Mailbox {
            tx,
            actor,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        MailboxReceiver { rx, actor },
    )
}

impl<M> Mailbox<M> {
    /// Enqueue a message, waiting only while the mailbox is full.
    ///
    /// Fire-and-forget: returns as soon as the message is queued, never
    /// waits for it to be processed.
    pub async fn send(&self, msg: M) -> Result<(), SendError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| SendError { actor: self.actor })
    }

    /// Non-blocking enqueue for interrupt and callback contexts.
    ///
    /// Overflow policy is fail-fast: a full mailbox drops the message,
    /// logs a warning, and increments the drop counter. Returns whether
    /// the message was queued.
    pub fn post(&self, msg: M) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(actor = self.actor, "mailbox full, dropping posted message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(actor = self.actor, "mailbox closed, dropping posted message");
                false
            }
        }
    }

    /// Messages discarded by [`post`](Self::post) because the mailbox was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Name of the owning actor.
    pub fn actor(&self) -> &'static str {
        self.actor
    }
}

impl<M> MailboxReceiver<M> {
    /// Wait for the next message. `None` once every producer is gone.
    pub async fn recv(&mut self) -> Option<M> {
        self.rx.recv().await
    }

    pub fn actor(&self) -> &'static str {
        self.actor
    }
}
