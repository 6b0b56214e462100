//! Actor trait and worker loop.

use crate::mailbox::MailboxReceiver;
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// What the worker loop does after a message is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep draining the mailbox.
    Continue,
    /// Terminate cooperatively; `on_stop` runs before the worker exits.
    Stop,
}

/// Behavior of a single-resource actor.
///
/// A handler runs to completion on the actor's own worker and may perform
/// synchronous hardware I/O; it must never wait on another actor's reply.
/// Returning `Flow::Stop` (the `Quit` message variants) ends the loop.
#[async_trait]
pub trait Actor: Send + 'static {
    type Message: Send + 'static;

    /// Name used in log records.
    fn name(&self) -> &'static str;

    async fn handle(&mut self, msg: Self::Message) -> anyhow::Result<Flow>;

    /// Runs on the worker before the first message.
    async fn on_start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Teardown after the loop ends (unmount, stop serving, leave network).
    async fn on_stop(&mut self) {}
}

/// Spawn the worker task for `actor`, consuming `receiver`.
///
/// A handler error is logged and the loop continues; there is no restart.
/// The loop also ends when every producer handle is dropped.
pub fn spawn<A: Actor>(mut actor: A, mut receiver: MailboxReceiver<A::Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = actor.name();
        if let Err(e) = actor.on_start().await {
            error!(actor = name, error = %e, "actor failed to start");
            return;
        }
        debug!(actor = name, "actor started");

        while let Some(msg) = receiver.recv().await {
            match actor.handle(msg).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(e) => {
                    error!(actor = name, error = %e, "message handling failed");
                }
            }
        }

        actor.on_stop().await;
        info!(actor = name, "actor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::mailbox;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    enum Msg {
        Bump,
        Fail,
        Quit,
    }

    struct Counter {
        handled: Arc<AtomicU32>,
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Actor for Counter {
        type Message = Msg;

        fn name(&self) -> &'static str {
            "counter"
        }

        async fn handle(&mut self, msg: Msg) -> anyhow::Result<Flow> {
            match msg {
                Msg::Bump => {
                    self.handled.fetch_add(1, Ordering::SeqCst);
                    Ok(Flow::Continue)
                }
                Msg::Fail => anyhow::bail!("induced failure"),
                Msg::Quit => Ok(Flow::Stop),
            }
        }

        async fn on_stop(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn quit_stops_loop_and_runs_teardown() {
        let handled = Arc::new(AtomicU32::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mailbox("counter", 8);
        let worker = spawn(
            Counter {
                handled: handled.clone(),
                stopped: stopped.clone(),
            },
            rx,
        );

        tx.send(Msg::Bump).await.unwrap();
        tx.send(Msg::Bump).await.unwrap();
        tx.send(Msg::Quit).await.unwrap();
        worker.await.unwrap();

        assert_eq!(handled.load(Ordering::SeqCst), 2);
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn handler_error_does_not_kill_worker() {
        let handled = Arc::new(AtomicU32::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mailbox("counter", 8);
        let worker = spawn(
            Counter {
                handled: handled.clone(),
                stopped: stopped.clone(),
            },
            rx,
        );

        tx.send(Msg::Fail).await.unwrap();
        tx.send(Msg::Bump).await.unwrap();
        tx.send(Msg::Quit).await.unwrap();
        worker.await.unwrap();

        // The failing message was logged and skipped, the next one handled.
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn worker_exits_when_producers_are_gone() {
        let handled = Arc::new(AtomicU32::new(0));
        let stopped = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mailbox("counter", 8);
        let worker = spawn(
            Counter {
                handled: handled.clone(),
                stopped: stopped.clone(),
            },
            rx,
        );
        drop(tx);
        worker.await.unwrap();
        assert!(stopped.load(Ordering::SeqCst));
    }
}
